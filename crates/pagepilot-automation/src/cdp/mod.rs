//! Chrome DevTools Protocol driver.
//!
//! Start Chrome with remote debugging and log in to the target site:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```
//!
//! ```rust,ignore
//! let client = Arc::new(CdpClient::connect("http://localhost:9222").await?);
//! let page = CdpPage::attach(client, "https://chatgpt.com").await?;
//! ```

mod client;
mod error;
mod page;
mod protocol;
mod script;

pub use client::CdpClient;
pub use error::CdpError;
pub use page::CdpPage;
pub use protocol::{BrowserVersion, PageInfo};
