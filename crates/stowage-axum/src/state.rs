//! Shared state handed to every handler.

use std::sync::Arc;

use crate::bootstrap::AxumContext;

pub type AppState = Arc<AxumContext>;
