//! Read-only lookups for referencing existing infrastructure.
//!
//! Unlike a managed record's read, a lookup of a missing resource is a
//! hard error: the caller asked for something by name and there is nothing
//! sensible to clear.

use crate::client::SandwichClient;
use crate::client::types::{NetworkSnapshot, RegionSnapshot};
use crate::error::{ProvisionError, Result};

/// Finds a region by name.
///
/// # Errors
///
/// Returns an error if no region with that name exists or the API call
/// fails.
pub async fn find_region(client: &SandwichClient, name: &str) -> Result<RegionSnapshot> {
    match client.regions().get(name).await {
        Err(err) if err.is_not_found() => Err(ProvisionError::internal(format!(
            "Could not find a region with the name of {name}"
        ))),
        other => other,
    }
}

/// Finds a network by name, verifying it lives in the expected region.
///
/// # Errors
///
/// Returns an error if no network with that name exists in the region or
/// the API call fails.
pub async fn find_network(
    client: &SandwichClient,
    name: &str,
    region_name: &str,
) -> Result<NetworkSnapshot> {
    let network = match client.networks().get(name).await {
        Err(err) if err.is_not_found() => {
            return Err(ProvisionError::internal(format!(
                "Could not find a network with the name of {name}"
            )));
        }
        other => other?,
    };

    if network.region_name != region_name {
        return Err(ProvisionError::internal(format!(
            "Network {name} exists but belongs to region {}, not {region_name}",
            network.region_name
        )));
    }

    Ok(network)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_find_region_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/regions/us-east"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "0b4bbd62-4ef7-4ba2-92ae-f7c7c1fbd4d9",
                "name": "us-east",
                "datacenter": "dc-1",
                "image_datastore": "images",
                "schedulable": true,
                "state": "Created",
            })))
            .mount(&server)
            .await;

        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        let region = assert_ok!(find_region(&client, "us-east").await);
        assert_eq!(region.datacenter, "dc-1");
    }

    #[tokio::test]
    async fn test_find_region_absence_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        let err = assert_err!(find_region(&client, "ghost").await);
        assert!(err.to_string().contains("ghost"));
    }
}
