//! Sample shapes used by the command line driver and the tests.
//!
//! `Thing` is deliberately messy: an embedded self pointer, two more self
//! pointers, scalars, a map, and nested anonymous aggregates reached through
//! sequences, pointers and maps.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::introspect_struct;

#[derive(Debug, Default)]
pub struct Thing {
    pub thing: Option<Box<Thing>>,
    pub nested_thing: Option<Box<Thing>>,
    pub another_nested_thing: Option<Box<Thing>>,
    pub cheese: f64,
    pub milk: HashMap<String, String>,
    pub pork: i64,
    pub grinch: Grinch,
    pub anon: Anon,
}

#[derive(Debug, Default)]
pub struct Grinch {
    pub hi: i64,
}

#[derive(Debug, Default)]
pub struct Anon {
    pub bilk: Vec<Option<Bilk>>,
}

#[derive(Debug, Default)]
pub struct Bilk {
    pub dilk: HashMap<String, Dilk>,
}

#[derive(Debug, Default)]
pub struct Dilk {
    pub drilk: DateTime<Utc>,
    pub boo: Duration,
}

introspect_struct! {
    Thing {
        #[embedded] thing: Option<Box<Thing>>,
        nested_thing: Option<Box<Thing>>,
        another_nested_thing: Option<Box<Thing>>,
        cheese: f64 = "json:\"cheese\"",
        milk: HashMap<String, String> = "json:\"milk\"",
        pork: i64 = "json:\"pork\"",
        grinch: Grinch = "json:\"grinch\"",
        anon: Anon = "json:\"anon\"",
    }
}

introspect_struct! {
    anonymous Grinch {
        hi: i64 = "json:\"hi\"",
    }
}

introspect_struct! {
    anonymous Anon {
        bilk: Vec<Option<Bilk>> = "json:\"bilk\"",
    }
}

introspect_struct! {
    anonymous Bilk {
        dilk: HashMap<String, Dilk> = "json:\"dilk\"",
    }
}

introspect_struct! {
    anonymous Dilk {
        drilk: DateTime<Utc> = "json:\"drilk\"",
        boo: Duration = "json:\"boo\"",
    }
}

/// A small named record, handy for field lookups.
#[derive(Debug, Default)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub email: Option<String>,
    pub tags: Vec<String>,
}

introspect_struct! {
    Person {
        name: String = "json:\"name\"",
        age: u32 = "json:\"age\"",
        email: Option<String> = "json:\"email,omitempty\"",
        tags: Vec<String> = "json:\"tags\"",
    }
}
