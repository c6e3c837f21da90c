//! pRPC: JSON-encoded RPCs over HTTP POST.
//!
//! Requests go to `https://<host>/prpc/<service>/<method>`. The gRPC status
//! comes back in the `X-Prpc-Grpc-Code` header; on success the body is the
//! JSON response behind an XSSI guard, otherwise it is the error message.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{code, code_from_http, ClientError};
use crate::http::{base_url, parse_json, HttpClient};

const GRPC_CODE_HEADER: &str = "x-prpc-grpc-code";

/// pRPC client bound to one host.
#[derive(Clone)]
pub struct PrpcClient {
    http: HttpClient,
    base_url: String,
}

impl PrpcClient {
    /// Create a client for `host`. A host with a scheme is used as-is.
    pub fn new(http: HttpClient, host: &str) -> Self {
        Self {
            http,
            base_url: base_url(host),
        }
    }

    /// Call `service.method` with a JSON request.
    pub async fn call<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        request: &Req,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/prpc/{}/{}", self.base_url, service, method);
        debug!(url = %url, "pRPC call");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let grpc_code = response
            .headers()
            .get(GRPC_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i32>().ok());
        let body = response.text().await?;

        let rpc_code = match grpc_code {
            Some(c) => c,
            None if status.is_success() => code::OK,
            None => code_from_http(status),
        };
        if rpc_code != code::OK {
            warn!(service, method, code = rpc_code, "pRPC call failed");
            return Err(ClientError::Rpc {
                code: rpc_code,
                message: body.trim().to_string(),
            });
        }

        parse_json(&body)
    }
}
