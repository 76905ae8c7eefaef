//! Durable relational storage and invariant maintenance.
//!
//! `Store` is the single owner of every row in the schema; every other
//! engine in this crate borrows read snapshots from it and mutates only
//! through its transactional methods. All multi-row writes run inside an
//! explicit `sqlx::Transaction`, mirroring the teacher's discipline of
//! opening one transaction per logical operation and never holding a
//! connection across unrelated awaits.
use sqlx::PgPool;

pub mod constraint;
pub mod kmat;
pub mod label;
pub mod node;
pub mod query;
pub mod successor;
pub mod user;

/// A handle to the relational backing store. Cheap to clone (wraps a pool).
#[derive(Clone)]
pub struct Store {
	pub(crate) pool: PgPool,
}

impl Store {
	pub fn new(pool: PgPool) -> Self {
		Self {
			pool,
		}
	}

	pub async fn connect(database_url: &str) -> crate::err::Result<Self> {
		let pool = PgPool::connect(database_url).await?;
		Ok(Self::new(pool))
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}
}
