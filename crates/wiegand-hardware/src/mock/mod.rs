//! Mock input lines for testing and development.
//!
//! Lines are driven through handles from test code, so the full reader
//! runtime can be exercised without a GPIO header.

pub mod line;
pub mod provider;

pub use line::{MockLine, MockLineHandle, transmit_frame};
pub use provider::MockProvider;
