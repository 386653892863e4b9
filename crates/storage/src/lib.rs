pub mod db;

pub use db::{open_book, DbPool, GnuCashBook, OpenOptions};
