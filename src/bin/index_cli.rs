//! Simple CLI for poking at either index kind directly.
//!
//! Usage:
//!   index_cli <data_dir> btree create
//!   index_cli <data_dir> btree insert <key> <value>
//!   index_cli <data_dir> btree find <key>
//!   index_cli <data_dir> btree count <key>
//!   index_cli <data_dir> btree min
//!   index_cli <data_dir> btree max
//!   index_cli <data_dir> btree flush
//!   index_cli <data_dir> btree stats
//!
//!   index_cli <data_dir> linear create
//!   index_cli <data_dir> linear insert <key> <value>
//!   index_cli <data_dir> linear find <key>
//!   index_cli <data_dir> linear count <key>
//!   index_cli <data_dir> linear min
//!   index_cli <data_dir> linear max
//!   index_cli <data_dir> linear flush
//!
//! Keys and values are decimal `u64`s; both index kinds are fixed at an
//! 8-byte key and an 8-byte value for the purposes of this tool.

use std::env;
use std::process::exit;
use std::sync::Arc;

use siodb_storage_core::btree::BPlusTree;
use siodb_storage_core::linear::{SortDirection, UniqueLinearIndex};
use siodb_storage_core::{IndexIdentity, StorageConfig};

fn identity() -> IndexIdentity {
    IndexIdentity::new([0u8; 16], 1, 1)
}

fn u64_compare() -> Arc<dyn Fn(&[u8], &[u8]) -> std::cmp::Ordering + Send + Sync> {
    Arc::new(|a: &[u8], b: &[u8]| {
        u64::from_be_bytes(a.try_into().unwrap()).cmp(&u64::from_be_bytes(b.try_into().unwrap()))
    })
}

fn parse_u64(arg: &str) -> u64 {
    arg.parse().unwrap_or_else(|_| {
        eprintln!("ERROR: expected a decimal u64, got {arg}");
        exit(1);
    })
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: index_cli <data_dir> <btree|linear> <command> [args...]");
        eprintln!("Commands: create, insert <key> <value>, find <key>, count <key>, min, max, flush, stats");
        exit(1);
    }
    let data_dir = &args[1];
    let kind = args[2].as_str();
    let command = args.get(3).map(String::as_str).unwrap_or("");
    let config = StorageConfig::new(data_dir);

    match kind {
        "btree" => run_btree(config, command, &args[4..]),
        "linear" => run_linear(config, command, &args[4..]),
        other => {
            eprintln!("Unknown index kind: {other}");
            exit(1);
        }
    }
}

fn run_btree(config: StorageConfig, command: &str, rest: &[String]) {
    if command == "create" {
        match BPlusTree::create(&config, identity(), 8, 8, u64_compare()) {
            Ok(_) => println!("OK"),
            Err(e) => {
                eprintln!("ERROR: {e}");
                exit(1);
            }
        }
        return;
    }

    let tree = match BPlusTree::open(&config, identity(), 8, 8, u64_compare()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("ERROR: failed to open index: {e}");
            exit(1);
        }
    };

    match command {
        "insert" => {
            let (key, value) = require_key_value(rest, "btree insert");
            match tree.insert(&key.to_be_bytes(), &value.to_be_bytes()) {
                Ok(true) => println!("OK"),
                Ok(false) => println!("ALREADY_EXISTS"),
                Err(e) => report_and_exit(e),
            }
        }
        "find" => {
            let key = require_key(rest, "btree find");
            match tree.find(&key.to_be_bytes()) {
                Ok(Some(v)) => println!("{}", u64::from_be_bytes(v.try_into().unwrap())),
                Ok(None) => println!("NOT_FOUND"),
                Err(e) => report_and_exit(e),
            }
        }
        "count" => {
            let key = require_key(rest, "btree count");
            match tree.count(&key.to_be_bytes()) {
                Ok(n) => println!("{n}"),
                Err(e) => report_and_exit(e),
            }
        }
        "min" => print_extremum(tree.get_min_key()),
        "max" => print_extremum(tree.get_max_key()),
        "flush" => match tree.flush() {
            Ok(()) => println!("OK"),
            Err(e) => report_and_exit(e),
        },
        "stats" => match tree.debug_dump() {
            Ok(dump) => match serde_json::to_string_pretty(&dump) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("ERROR: {e}");
                    exit(1);
                }
            },
            Err(e) => report_and_exit(e),
        },
        other => {
            eprintln!("Unknown command: {other}");
            exit(1);
        }
    }
}

fn run_linear(config: StorageConfig, command: &str, rest: &[String]) {
    if command == "create" {
        match UniqueLinearIndex::create(config, identity(), 8, 8, false, SortDirection::Ascending) {
            Ok(_) => println!("OK"),
            Err(e) => {
                eprintln!("ERROR: {e}");
                exit(1);
            }
        }
        return;
    }

    let index = match UniqueLinearIndex::open(config, identity(), 8, 8, false, SortDirection::Ascending) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("ERROR: failed to open index: {e}");
            exit(1);
        }
    };

    match command {
        "insert" => {
            let (key, value) = require_key_value(rest, "linear insert");
            match index.insert(&key.to_be_bytes(), &value.to_be_bytes(), false) {
                Ok(true) => println!("OK"),
                Ok(false) => println!("ALREADY_EXISTS"),
                Err(e) => report_and_exit(e),
            }
        }
        "find" => {
            let key = require_key(rest, "linear find");
            match index.find(&key.to_be_bytes()) {
                Ok(Some(v)) => println!("{}", u64::from_be_bytes(v.try_into().unwrap())),
                Ok(None) => println!("NOT_FOUND"),
                Err(e) => report_and_exit(e),
            }
        }
        "count" => {
            let key = require_key(rest, "linear count");
            match index.count(&key.to_be_bytes()) {
                Ok(n) => println!("{n}"),
                Err(e) => report_and_exit(e),
            }
        }
        "min" => print_extremum(Ok(index.get_min_key())),
        "max" => print_extremum(Ok(index.get_max_key())),
        "flush" => match index.flush() {
            Ok(()) => println!("OK"),
            Err(e) => report_and_exit(e),
        },
        other => {
            eprintln!("Unknown command: {other}");
            exit(1);
        }
    }
}

fn require_key(rest: &[String], usage: &str) -> u64 {
    match rest.first() {
        Some(k) => parse_u64(k),
        None => {
            eprintln!("Usage: index_cli <data_dir> {usage} <key>");
            exit(1);
        }
    }
}

fn require_key_value(rest: &[String], usage: &str) -> (u64, u64) {
    if rest.len() < 2 {
        eprintln!("Usage: index_cli <data_dir> {usage} <key> <value>");
        exit(1);
    }
    (parse_u64(&rest[0]), parse_u64(&rest[1]))
}

fn print_extremum(result: siodb_storage_core::Result<Option<Vec<u8>>>) {
    match result {
        Ok(Some(v)) => println!("{}", u64::from_be_bytes(v.try_into().unwrap())),
        Ok(None) => println!("EMPTY"),
        Err(e) => report_and_exit(e),
    }
}

fn report_and_exit(e: siodb_storage_core::StorageError) -> ! {
    eprintln!("ERROR: {e}");
    exit(1);
}
