//! MCP client side: the transport seam, the rmcp-backed session, and the connection registry.

pub mod registry;
pub mod rmcp_session;
pub mod session;

pub use registry::ConnectionRegistry;
pub use rmcp_session::{RmcpConnector, RmcpSession};
pub use session::{Connector, Session, ToolDescriptor};
