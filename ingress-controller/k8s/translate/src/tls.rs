use crate::TranslateError;
use apisix_ingress_controller_core::{gen_id, ssl_name, ClientTls, Ssl};
use apisix_ingress_controller_k8s_api::{apisix::ApisixTls, secret, Lookup, ResourceExt};

/// Builds the SSL object for an `ApisixTls`, reading the serving certificate and, for mutual TLS,
/// the client CA from their Secrets.
pub async fn translate_apisix_tls<L: Lookup + ?Sized>(
    lookup: &L,
    tls: &ApisixTls,
) -> Result<Ssl, TranslateError> {
    let ns = tls.namespace().unwrap_or_default();
    let name = tls.name_any();

    let serving = lookup
        .secret(&tls.spec.secret.namespace, &tls.spec.secret.name)
        .await?;
    let kp = secret::key_pair(&serving)?;

    let client = match tls.spec.client.as_ref() {
        Some(client) => {
            let ca = lookup
                .secret(&client.ca_secret.namespace, &client.ca_secret.name)
                .await?;
            Some(ClientTls {
                ca: secret::ca_cert(&ca)?,
                depth: client.depth,
                skip_mtls_uri_regex: client.skip_mtls_uri_regex.clone(),
            })
        }
        None => None,
    };

    Ok(Ssl {
        id: gen_id(&ssl_name(&ns, &name)),
        snis: tls.spec.hosts.clone(),
        cert: kp.cert,
        key: kp.key,
        client,
    })
}
