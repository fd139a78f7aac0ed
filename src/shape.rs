//! Declared type shapes.
//!
//! Rust carries no runtime reflection, so every introspectable type declares
//! its structural shape through [`Introspect`]. Children are referenced through
//! `fn() -> TypeShape` pointers, which keeps self-referential types finite:
//! nothing recurses until the graph builder asks for a child.
//!
//! Mapping of std types onto the closed set of shape categories:
//! - `Option<T>`, `Rc<T>`, `Arc<T>`, `&'static T` → pointer (nullable / shared
//!   indirection)
//! - `Box<T>` → transparent, reports `T` itself
//! - `Vec<T>`, `VecDeque<T>`, `[T; N]`, `&'static [T]` → sequence
//! - `HashMap`, `BTreeMap`, `IndexMap` → map
//! - tuples and `()` → anonymous aggregates
//! - fn pointers, channels, raw pointers, boxed `dyn Any` → opaque
//! - bare `dyn Any` → untyped

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::value::Value;

/// Lazily produces the shape of a child type.
pub type ShapeFn = fn() -> TypeShape;

/// A type's identity plus its declared shape.
#[derive(Debug, Clone)]
pub struct TypeShape {
    pub id: TypeId,
    pub rust_type: &'static str,
    pub shape: Shape,
}

impl TypeShape {
    pub fn new<T: ?Sized + 'static>(shape: Shape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            rust_type: std::any::type_name::<T>(),
            shape,
        }
    }

    pub fn of<T: Introspect + ?Sized>() -> Self {
        T::type_shape()
    }
}

#[derive(Debug, Clone)]
pub enum Shape {
    /// No declared shape information (an erased value).
    Untyped,
    Pointer(ShapeFn),
    Sequence(ShapeFn),
    Map { key: ShapeFn, value: ShapeFn },
    /// `name` is `None` for anonymous aggregates (tuples, `anonymous` structs).
    Aggregate {
        name: Option<&'static str>,
        fields: Vec<FieldShape>,
    },
    Scalar(ScalarKind),
    /// Representable only as a stub: functions, channels, raw pointers.
    Opaque,
    /// Sum types. Outside the closed set the builder understands.
    Enum {
        name: &'static str,
        variants: Vec<&'static str>,
    },
}

impl Shape {
    pub fn category(&self) -> &'static str {
        match self {
            Shape::Untyped => "untyped",
            Shape::Pointer(_) => "pointer",
            Shape::Sequence(_) => "sequence",
            Shape::Map { .. } => "map",
            Shape::Aggregate { .. } => "aggregate",
            Shape::Scalar(_) => "scalar",
            Shape::Opaque => "opaque",
            Shape::Enum { .. } => "enum",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: &'static str,
    /// Raw tag / metadata text, empty when absent.
    pub tag: &'static str,
    pub embedded: bool,
    pub shape: ShapeFn,
}

impl FieldShape {
    pub fn new(name: &'static str, shape: ShapeFn) -> Self {
        Self { name, tag: "", embedded: false, shape }
    }

    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Char,
    String,
    Str,
    Duration,
    Timestamp,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::String => "String",
            Self::Str => "&str",
            Self::Duration => "Duration",
            Self::Timestamp => "DateTime<Utc>",
        }
    }

    /// The intrinsic default of the scalar.
    pub fn zero(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::I8 => Value::I8(0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::I128 => Value::I128(0),
            Self::Isize => Value::Isize(0),
            Self::U8 => Value::U8(0),
            Self::U16 => Value::U16(0),
            Self::U32 => Value::U32(0),
            Self::U64 => Value::U64(0),
            Self::U128 => Value::U128(0),
            Self::Usize => Value::Usize(0),
            Self::F32 => Value::F32(OrderedFloat(0.0)),
            Self::F64 => Value::F64(OrderedFloat(0.0)),
            Self::Char => Value::Char('\0'),
            Self::String | Self::Str => Value::String(String::new()),
            Self::Duration => Value::Duration(Duration::ZERO),
            Self::Timestamp => Value::Timestamp(DateTime::<Utc>::default()),
        }
    }
}

/// Declares the structural shape of a type.
///
/// Implement [`Introspect::shape`]; override [`Introspect::type_shape`] only
/// when the type should share another type's identity (see `Box<T>`).
/// Structs usually go through [`introspect_struct!`](crate::introspect_struct).
pub trait Introspect: 'static {
    fn shape() -> Shape;

    fn type_shape() -> TypeShape {
        TypeShape::new::<Self>(Self::shape())
    }
}

// ------------------------------- Scalars ---------------------------------- //

macro_rules! scalar_shape {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Introspect for $ty {
                fn shape() -> Shape {
                    Shape::Scalar(ScalarKind::$kind)
                }
            }
        )*
    };
}

scalar_shape! {
    bool => Bool,
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, i128 => I128, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, u128 => U128, usize => Usize,
    f32 => F32, f64 => F64,
    char => Char,
    String => String,
    &'static str => Str,
    Duration => Duration,
    DateTime<Utc> => Timestamp,
}

// ------------------------------ Indirection ------------------------------- //

impl<T: Introspect> Introspect for Option<T> {
    fn shape() -> Shape {
        Shape::Pointer(TypeShape::of::<T>)
    }
}

impl<T: Introspect> Introspect for Rc<T> {
    fn shape() -> Shape {
        Shape::Pointer(TypeShape::of::<T>)
    }
}

impl<T: Introspect> Introspect for Arc<T> {
    fn shape() -> Shape {
        Shape::Pointer(TypeShape::of::<T>)
    }
}

impl<T: Introspect> Introspect for &'static T {
    fn shape() -> Shape {
        Shape::Pointer(TypeShape::of::<T>)
    }
}

impl<T: Introspect> Introspect for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn type_shape() -> TypeShape {
        T::type_shape()
    }
}

// ------------------------------ Sequences --------------------------------- //

impl<T: Introspect> Introspect for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(TypeShape::of::<T>)
    }
}

impl<T: Introspect> Introspect for VecDeque<T> {
    fn shape() -> Shape {
        Shape::Sequence(TypeShape::of::<T>)
    }
}

impl<T: Introspect, const N: usize> Introspect for [T; N] {
    fn shape() -> Shape {
        Shape::Sequence(TypeShape::of::<T>)
    }
}

impl<T: Introspect> Introspect for &'static [T] {
    fn shape() -> Shape {
        Shape::Sequence(TypeShape::of::<T>)
    }
}

// -------------------------------- Maps ------------------------------------ //

impl<K: Introspect, V: Introspect, S: 'static> Introspect for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::Map { key: TypeShape::of::<K>, value: TypeShape::of::<V> }
    }
}

impl<K: Introspect, V: Introspect> Introspect for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::Map { key: TypeShape::of::<K>, value: TypeShape::of::<V> }
    }
}

impl<K: Introspect, V: Introspect, S: 'static> Introspect for IndexMap<K, V, S> {
    fn shape() -> Shape {
        Shape::Map { key: TypeShape::of::<K>, value: TypeShape::of::<V> }
    }
}

// ------------------------- Anonymous aggregates --------------------------- //

impl Introspect for () {
    fn shape() -> Shape {
        Shape::Aggregate { name: None, fields: Vec::new() }
    }
}

macro_rules! tuple_shape {
    ($($idx:tt $t:ident),+) => {
        impl<$($t: Introspect),+> Introspect for ($($t,)+) {
            fn shape() -> Shape {
                Shape::Aggregate {
                    name: None,
                    fields: vec![$(FieldShape::new(stringify!($idx), TypeShape::of::<$t>)),+],
                }
            }
        }
    };
}

tuple_shape!(0 A);
tuple_shape!(0 A, 1 B);
tuple_shape!(0 A, 1 B, 2 C);
tuple_shape!(0 A, 1 B, 2 C, 3 D);
tuple_shape!(0 A, 1 B, 2 C, 3 D, 4 E);
tuple_shape!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);

// ------------------------------- Opaque ----------------------------------- //

macro_rules! opaque_shape {
    ($(impl<$($g:ident),*> for $ty:ty;)*) => {
        $(
            impl<$($g: ?Sized + 'static),*> Introspect for $ty {
                fn shape() -> Shape {
                    Shape::Opaque
                }
            }
        )*
    };
}

opaque_shape! {
    impl<T> for *const T;
    impl<T> for *mut T;
}

impl<T: 'static> Introspect for Sender<T> {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl<T: 'static> Introspect for SyncSender<T> {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl<T: 'static> Introspect for Receiver<T> {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl<R: 'static> Introspect for fn() -> R {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl<A: 'static, R: 'static> Introspect for fn(A) -> R {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl<A: 'static, B: 'static, R: 'static> Introspect for fn(A, B) -> R {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl Introspect for Box<dyn Any> {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl Introspect for Box<dyn Any + Send> {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl Introspect for Box<dyn Any + Send + Sync> {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

impl Introspect for dyn Any {
    fn shape() -> Shape {
        Shape::Untyped
    }
}

// ------------------------------- Structs ---------------------------------- //

/// Implements [`Introspect`] for a struct.
///
/// ```
/// use structmeta::introspect_struct;
///
/// #[derive(Default)]
/// struct Point { x: i64, y: i64, label: Option<String> }
///
/// introspect_struct! {
///     Point {
///         x: i64 = "json:\"x\"",
///         y: i64 = "json:\"y\"",
///         label: Option<String>,
///     }
/// }
/// ```
///
/// Prefix a field with `#[embedded]` to flag it as embedded, and prefix the
/// type with `anonymous` to have the descriptor name synthesized from its
/// field names.
#[macro_export]
macro_rules! introspect_struct {
    (@impl $ty:ty, $name:expr, {
        $( $(#[$flag:ident])* $field:ident : $fty:ty $(= $tag:literal)? ),* $(,)?
    }) => {
        impl $crate::Introspect for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::Aggregate {
                    name: $name,
                    fields: vec![$(
                        $crate::FieldShape {
                            name: stringify!($field),
                            tag: $crate::introspect_struct!(@tag $($tag)?),
                            embedded: $crate::introspect_struct!(@embedded $($flag)*),
                            shape: <$fty as $crate::Introspect>::type_shape,
                        }
                    ),*],
                }
            }
        }
    };
    (@tag) => { "" };
    (@tag $tag:literal) => { $tag };
    (@embedded) => { false };
    (@embedded embedded $($rest:ident)*) => { true };
    (@embedded $other:ident $($rest:ident)*) => {
        $crate::introspect_struct!(@embedded $($rest)*)
    };
    (anonymous $ty:ty { $($body:tt)* }) => {
        $crate::introspect_struct!(@impl $ty, ::core::option::Option::None, { $($body)* });
    };
    ($ty:ty { $($body:tt)* }) => {
        $crate::introspect_struct!(
            @impl $ty,
            ::core::option::Option::Some(stringify!($ty)),
            { $($body)* }
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_shares_identity_with_its_content() {
        let boxed = TypeShape::of::<Box<String>>();
        let plain = TypeShape::of::<String>();
        assert_eq!(boxed.id, plain.id);
        assert!(matches!(boxed.shape, Shape::Scalar(ScalarKind::String)));
    }

    #[test]
    fn tuples_are_anonymous_aggregates() {
        let shape = TypeShape::of::<(u8, String)>();
        match shape.shape {
            Shape::Aggregate { name, fields } => {
                assert!(name.is_none());
                let names: Vec<_> = fields.iter().map(|f| f.name).collect();
                assert_eq!(names, ["0", "1"]);
            }
            other => panic!("expected aggregate, got {}", other.category()),
        }
    }

    #[test]
    fn children_resolve_lazily() {
        let shape = TypeShape::of::<Option<Vec<i32>>>();
        let Shape::Pointer(target) = shape.shape else {
            panic!("expected pointer");
        };
        let Shape::Sequence(element) = target().shape else {
            panic!("expected sequence");
        };
        assert_eq!(element().id, TypeId::of::<i32>());
    }

    #[test]
    fn scalar_zero_values_are_intrinsic_defaults() {
        let cases = [
            (TypeShape::of::<bool>(), Value::Bool(bool::default())),
            (TypeShape::of::<i8>(), Value::I8(i8::default())),
            (TypeShape::of::<i16>(), Value::I16(i16::default())),
            (TypeShape::of::<i32>(), Value::I32(i32::default())),
            (TypeShape::of::<i64>(), Value::I64(i64::default())),
            (TypeShape::of::<i128>(), Value::I128(i128::default())),
            (TypeShape::of::<isize>(), Value::Isize(isize::default())),
            (TypeShape::of::<u8>(), Value::U8(u8::default())),
            (TypeShape::of::<u16>(), Value::U16(u16::default())),
            (TypeShape::of::<u32>(), Value::U32(u32::default())),
            (TypeShape::of::<u64>(), Value::U64(u64::default())),
            (TypeShape::of::<u128>(), Value::U128(u128::default())),
            (TypeShape::of::<usize>(), Value::Usize(usize::default())),
            (TypeShape::of::<f32>(), Value::F32(OrderedFloat(f32::default()))),
            (TypeShape::of::<f64>(), Value::F64(OrderedFloat(f64::default()))),
            (TypeShape::of::<char>(), Value::Char(char::default())),
            (TypeShape::of::<String>(), Value::String(String::default())),
            (TypeShape::of::<&'static str>(), Value::String(<&str>::default().to_string())),
            (TypeShape::of::<Duration>(), Value::Duration(Duration::default())),
            (TypeShape::of::<DateTime<Utc>>(), Value::Timestamp(DateTime::<Utc>::default())),
        ];
        for (shape, expected) in cases {
            let Shape::Scalar(kind) = shape.shape else {
                panic!("{} is not a scalar", shape.rust_type);
            };
            assert_eq!(kind.zero(), expected, "zero of {}", kind.name());
        }
    }

    #[test]
    fn static_references_are_pointers() {
        let shape = TypeShape::of::<&'static u16>();
        let Shape::Pointer(target) = shape.shape else {
            panic!("expected pointer");
        };
        assert_eq!(target().id, TypeId::of::<u16>());
    }

    #[allow(dead_code)]
    struct Tagged {
        _inner: Option<Box<Tagged>>,
        _count: u32,
    }

    introspect_struct! {
        Tagged {
            #[embedded] _inner: Option<Box<Tagged>>,
            _count: u32 = "json:\"count\"",
        }
    }

    #[test]
    fn macro_records_tags_and_embedded_flags() {
        let Shape::Aggregate { name, fields } = Tagged::shape() else {
            panic!("expected aggregate");
        };
        assert_eq!(name, Some("Tagged"));
        assert_eq!(fields.len(), 2);
        assert!(fields[0].embedded);
        assert_eq!(fields[0].tag, "");
        assert!(!fields[1].embedded);
        assert_eq!(fields[1].tag, "json:\"count\"");
    }
}
