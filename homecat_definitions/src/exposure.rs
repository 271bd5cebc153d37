use k8s_openapi::api::{
    core::v1::{Service, ServicePort, ServiceSpec},
    networking::v1::{
        HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
        IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
    },
};
use k8s_openapi::apimachinery::pkg::{apis::meta::v1::ObjectMeta, util::intstr::IntOrString};
use merge::Merge;
use std::collections::BTreeMap;

/// Annotation telling cert-manager which issuer signs the TLS secret
pub const CLUSTER_ISSUER_ANNOTATION: &str = "cert-manager.io/cluster-issuer";
pub const DEFAULT_CLUSTER_ISSUER: &str = "acme-prod";

/// Externally visible host of an exposed name
pub fn host_name(name: &str, parent_domain: &str) -> String {
    format!("{}.{}", name, parent_domain)
}

/// Secret cert-manager writes the certificate for `name` into
pub fn tls_secret_name(name: &str) -> String {
    format!("{}-cert", name)
}

/// A Service and the Ingress routing to it
///
/// Both carry the same name and the selector of the pod they front.
#[derive(Clone, Debug, PartialEq)]
pub struct ExposureBundle {
    pub service: Service,
    pub ingress: Ingress,
}

impl ExposureBundle {
    pub fn name(&self) -> Option<&str> {
        self.service.metadata.name.as_deref()
    }

    pub fn selector(&self) -> Option<&BTreeMap<String, String>> {
        self.service.spec.as_ref().and_then(|s| s.selector.as_ref())
    }

    pub fn host(&self) -> Option<&str> {
        self.ingress
            .spec
            .as_ref()
            .and_then(|s| s.rules.as_ref())
            .and_then(|r| r.first())
            .and_then(|r| r.host.as_deref())
    }

    pub fn tls_secret(&self) -> Option<&str> {
        self.ingress
            .spec
            .as_ref()
            .and_then(|s| s.tls.as_ref())
            .and_then(|t| t.first())
            .and_then(|t| t.secret_name.as_deref())
    }

    pub fn annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.ingress.metadata.annotations.as_ref()
    }
}

/// Expose `port` of the pods matching `selector` as `https://<name>.<parent_domain>`
///
/// The Service listens on and targets the same port.
/// `annotation_overrides` win over the default issuer annotation.
pub fn compose_exposure(
    name: &str,
    port: u16,
    selector: &BTreeMap<String, String>,
    parent_domain: &str,
    annotation_overrides: &BTreeMap<String, String>,
) -> ExposureBundle {
    let host = host_name(name, parent_domain);
    let annotations = btreemap! {
        CLUSTER_ISSUER_ANNOTATION.to_string() => DEFAULT_CLUSTER_ISSUER.to_string(),
    }
    .merge(annotation_overrides.clone());
    debug!("exposing {}:{} as {}", name, port, host);

    let service = Service {
        metadata: ObjectMeta {
            name: Some(name.into()),
            labels: Some(selector.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector.clone()),
            ports: Some(vec![ServicePort {
                name: Some("http".into()),
                port: port.into(),
                target_port: Some(IntOrString::Int(port.into())),
                protocol: Some("TCP".into()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let ingress = Ingress {
        metadata: ObjectMeta {
            name: Some(name.into()),
            labels: Some(selector.clone()),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(host.clone()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".into()),
                        path_type: "Prefix".into(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: name.into(),
                                port: Some(ServiceBackendPort {
                                    number: Some(port.into()),
                                    ..Default::default()
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            tls: Some(vec![IngressTLS {
                hosts: Some(vec![host]),
                secret_name: Some(tls_secret_name(name)),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    ExposureBundle { service, ingress }
}
