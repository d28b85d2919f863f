pub mod browser;
pub mod config;
pub mod element;
pub mod error;
pub mod order;
pub mod page;
pub mod session;
pub mod submit;

pub use browser::HeadlessBrowser;
pub use config::{BrowserBuilder, BrowserConfig};
pub use error::{BrowserError, ExtractionError, OrderError, Result};
pub use order::{OrderRequest, OrderResponse, PizzaSize, Topping};
pub use page::Page;
pub use session::{FormPage, FormSession, Launcher};
pub use submit::{extract_response, submit_order, submit_order_with, OrderClient};
