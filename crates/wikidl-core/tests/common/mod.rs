#![allow(dead_code)]

pub mod wiki_server;
