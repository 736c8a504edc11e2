//! Primitives - descriptor building blocks.
//!
//! - [`element`] - host element builder (`div`, `span`, ...)
//! - [`text`] - text child
//! - [`component`] - function component element
//!
//! ```ignore
//! let counter = Component::new("Counter", |_, hooks| {
//!     let (count, _) = hooks.use_state(|| 0);
//!     text(format!("count: {count}"))
//! });
//!
//! let tree = element("div")
//!     .attr("bold", true)
//!     .child(component(&counter, Props::new()))
//!     .build();
//! ```

mod element;

pub use element::{component, element, text, ElementBuilder};
