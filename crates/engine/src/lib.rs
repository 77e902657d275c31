//! Service core for the expense tracker.
//!
//! The engine owns an injected database handle and exposes ownership-scoped
//! operations over users, groups, categories and expenses. Every mutation
//! validates its input first, then runs its check-and-write steps inside one
//! database transaction.

pub use error::EngineError;
pub use ops::{Engine, EngineBuilder, ExpenseChanges, ExpenseDraft, ExpenseListFilter, ExpensePage};

pub mod categories;
pub mod expenses;
pub mod groups;
pub mod users;

mod error;
mod ops;
mod validation;

type ResultEngine<T> = Result<T, EngineError>;
