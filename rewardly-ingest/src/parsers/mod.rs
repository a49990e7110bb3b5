pub mod amount;
pub mod transactions_csv;
