#![allow(dead_code)]

pub mod match_files;
pub mod seedpick_env;
