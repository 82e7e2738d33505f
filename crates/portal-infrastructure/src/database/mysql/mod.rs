//! MySQL store implementations for the three logical databases

mod crm_store_impl;
mod ledger_store_impl;
mod portal_store_impl;

pub use crm_store_impl::MySqlCrmStore;
pub use ledger_store_impl::MySqlLedgerStore;
pub use portal_store_impl::MySqlPortalStore;
