pub mod http;
pub mod panel;

pub use http::{ApiClient, ClientError};
pub use panel::{Banner, EntityPanel, PanelError, PanelMode, SubmitTarget, Submission};
