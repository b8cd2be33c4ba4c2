//! `ferrokv` is an embedded, single-file key/value storage engine backed by
//! an on-disk B-tree, with multi-collection support and single-writer,
//! multi-reader transactions.
//!
//! ```no_run
//! use ferrokv::{Db, Options};
//!
//! # fn main() -> ferrokv::Result<()> {
//! let db = Db::open("my.db".as_ref(), Options::default())?;
//!
//! let mut tx = db.write_tx()?;
//! let mut users = ferrokv::collection::create(&mut tx, b"users")?;
//! users.put(&mut tx, b"alice".to_vec(), b"1".to_vec())?;
//! tx.commit()?;
//!
//! let tx = db.read_tx()?;
//! let users = ferrokv::collection::open(&tx, b"users")?.expect("just created");
//! assert_eq!(users.get(&tx, b"alice")?, Some(b"1".to_vec()));
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod db;
pub mod error;
pub mod storage;
pub mod tx;

pub use collection::Collection;
pub use db::{Db, Options};
pub use error::{Error, Result};
pub use storage::node::Item;
pub use tx::Tx;
