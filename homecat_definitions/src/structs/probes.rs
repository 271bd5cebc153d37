use k8s_openapi::{api::core::v1 as core, apimachinery::pkg::util::intstr::IntOrString};
use std::convert::TryFrom;

use super::{ErrorKind, Result};

/// Grace period before the first probe of a defaulted liveness check
///
/// 5 is the kube standard delay; most of the images we run take a while to boot.
pub const DEFAULT_PROBE_INITIAL_DELAY_SECONDS: u32 = 30;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HttpGet {
    /// Port to GET from
    pub port: u16,
    /// Uri path to GET (kube defaults to /)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// HTTP or HTTPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TcpSocket {
    pub port: u16,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Exec {
    /// Command to execute in the container
    pub command: Vec<String>,
}

/// Liveness Probe
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Probe {
    /// Http Get probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_get: Option<HttpGet>,

    /// Tcp Socket probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_socket: Option<TcpSocket>,

    /// Shell exec probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<Exec>,

    /// How long to wait before kube performs first probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<u32>,

    /// How long between each probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<u32>,
}

impl Probe {
    /// HTTP GET against `/` on the given port, after the standard grace period
    pub fn http(port: u16) -> Self {
        Probe {
            http_get: Some(HttpGet {
                port,
                ..Default::default()
            }),
            initial_delay_seconds: Some(DEFAULT_PROBE_INITIAL_DELAY_SECONDS),
            ..Default::default()
        }
    }

    /// TCP connect on the given port, after the standard grace period
    pub fn tcp(port: u16) -> Self {
        Probe {
            tcp_socket: Some(TcpSocket { port }),
            initial_delay_seconds: Some(DEFAULT_PROBE_INITIAL_DELAY_SECONDS),
            ..Default::default()
        }
    }

    pub fn verify(&self, workload: &str) -> Result<()> {
        let handlers = [
            self.http_get.is_some(),
            self.tcp_socket.is_some(),
            self.exec.is_some(),
        ]
        .iter()
        .filter(|x| **x)
        .count();
        if handlers == 0 {
            bail!(ErrorKind::InvalidProbe(
                workload.into(),
                "needs one of 'httpGet', 'tcpSocket', 'exec'".into()
            ));
        }
        if handlers > 1 {
            bail!(ErrorKind::InvalidProbe(
                workload.into(),
                "can have at most one of 'httpGet', 'tcpSocket', 'exec'".into()
            ));
        }
        if let Some(e) = &self.exec {
            if e.command.is_empty() {
                bail!(ErrorKind::InvalidProbe(workload.into(), "empty exec command".into()));
            }
        }
        let timings = [
            ("initialDelaySeconds", self.initial_delay_seconds),
            ("periodSeconds", self.period_seconds),
        ];
        for (field, secs) in timings.iter() {
            if let Some(s) = secs {
                if i32::try_from(*s).is_err() {
                    bail!(ErrorKind::InvalidProbe(
                        workload.into(),
                        format!("{} {} is out of range", field, s)
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn to_kube(&self) -> core::Probe {
        core::Probe {
            http_get: self.http_get.as_ref().map(|h| core::HTTPGetAction {
                port: IntOrString::Int(h.port.into()),
                path: h.path.clone(),
                scheme: h.scheme.clone(),
                ..Default::default()
            }),
            tcp_socket: self.tcp_socket.as_ref().map(|t| core::TCPSocketAction {
                port: IntOrString::Int(t.port.into()),
                host: None,
            }),
            exec: self.exec.as_ref().map(|e| core::ExecAction {
                command: Some(e.command.clone()),
            }),
            initial_delay_seconds: self.initial_delay_seconds.map(seconds),
            period_seconds: self.period_seconds.map(seconds),
            ..Default::default()
        }
    }
}

/// Kube wants an i32; anything larger is rejected by `verify`
fn seconds(s: u32) -> i32 {
    i32::try_from(s).unwrap_or(i32::MAX)
}
