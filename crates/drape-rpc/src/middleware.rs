// crates/drape-rpc/src/middleware.rs
//
// Request interceptors for the RPC server.

use tonic::{Request, Status};

/// Logs the metadata of each incoming request.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    tracing::debug!(metadata = ?req.metadata(), "Incoming RPC request");
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interceptor_passes_requests_through() {
        let mut req = Request::new(());
        req.metadata_mut()
            .insert("x-client", "drape-cli".parse().unwrap());
        let out = logging_interceptor(req).unwrap();
        assert_eq!(out.metadata().get("x-client").unwrap().to_str().unwrap(), "drape-cli");
    }
}
