//! Sales
//!
//! [`allocator`] answers "which batches does this quantity come from and at
//! what price"; [`workflow`] drives a cart through validation, allocation,
//! stock deduction and transaction recording against the document store.

pub mod allocator;
pub mod workflow;

pub use allocator::{Allocation, AllocationError, AllocationLine};
pub use workflow::{CartLine, CompleteSaleRequest, CompleteSaleResponse, SaleService};
