//! Use cases (application services)

pub mod build_catalog;
pub mod conversation_loop;
pub mod router;
pub mod tool_context;

#[cfg(test)]
pub(crate) mod test_support;
