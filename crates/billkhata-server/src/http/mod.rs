pub(crate) mod auth;
pub(crate) mod bills;
pub(crate) mod deposits;
pub(crate) mod duties;
pub(crate) mod expenses;
pub(crate) mod handlers;
pub(crate) mod khatas;
pub(crate) mod ledger;
pub(crate) mod meals;
pub(crate) mod notifications;
