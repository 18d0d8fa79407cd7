// crates/drape-rpc/src/lib.rs
//
// drape-rpc: JSON-RPC server and handlers for the Drape recommender.
//
// A single tonic service accepts JSON envelopes carrying a method name and
// params, dispatches to the handler modules, and answers with a JSON
// envelope. No proto codegen is involved.

pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{DrapeRpcServer, JsonRpcRequest, JsonRpcResponse, RpcConfig};
