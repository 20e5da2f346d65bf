//! Resolvers: one per URL shape, each turning a classified target into
//! instance handles, possibly via a chain of dependent lookups.
//!
//! Resolution of a URL list is fail-fast: the first error aborts the rest.
//! Lookup errors are wrapped with the href being processed; no resolver
//! retries.

use crate::handle::Handle;
use crate::urls::{classify, cloud_of_instance_href, Target};
use cirrus_api::{Environment, Environments};
use cirrus_core::types::View;
use cirrus_core::{Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Resolve a list of console URLs into instance handles, in input order,
/// with array expansions appended in place.
///
/// # Errors
///
/// Fail-fast: the first classification or lookup error aborts resolution of
/// the remaining URLs.
pub async fn resolve_urls(
    environments: &Environments,
    urls: &[String],
    prompt: bool,
) -> Result<Vec<Handle>> {
    let mut handles = Vec::with_capacity(urls.len());
    for url in urls {
        let target = classify(url)?;
        debug!(%url, ?target, "classified console URL");
        resolve_target(environments, target, prompt, &mut handles).await?;
    }
    Ok(handles)
}

async fn resolve_target(
    environments: &Environments,
    target: Target,
    prompt: bool,
    out: &mut Vec<Handle>,
) -> Result<()> {
    match target {
        Target::InstanceHref(href) => {
            let environment = environments.default_environment();
            out.push(instance_by_href(&environment, &href, prompt).await?);
        }
        Target::ServerHref(href) => {
            let environment = environments.default_environment();
            out.push(instance_by_server_href(&environment, &href, prompt).await?);
        }
        Target::ServerArrayHref(href) => {
            let environment = environments.default_environment();
            out.extend(instances_by_array_href(&environment, &href, prompt).await?);
        }
        Target::InstancePage {
            host,
            account,
            cloud,
            legacy_id,
        } => {
            let environment = environments.for_account(account, &host)?;
            out.push(instance_by_legacy_id(&environment, cloud, legacy_id, prompt).await?);
        }
        Target::ServerPage {
            host,
            account,
            server_id,
            instance_id,
        } => {
            let environment = environments.for_account(account, &host)?;
            let href = format!("/api/servers/{server_id}");
            match instance_id {
                Some(legacy_id) => {
                    out.push(instance_by_next_instance(&environment, &href, legacy_id, prompt).await?);
                }
                None => out.push(instance_by_server_href(&environment, &href, prompt).await?),
            }
        }
        Target::ServerArrayPage {
            host,
            account,
            array_id,
        } => {
            let environment = environments.for_account(account, &host)?;
            let href = format!("/api/server_arrays/{array_id}");
            out.extend(instances_by_array_href(&environment, &href, prompt).await?);
        }
        Target::RedirectPage {
            host,
            account,
            resource_type,
            resource_uri,
        } => {
            let environment = environments.for_account(account, &host)?;
            match resource_type.as_str() {
                "instance" => out.push(instance_by_href(&environment, &resource_uri, prompt).await?),
                "server" => {
                    out.push(instance_by_server_href(&environment, &resource_uri, prompt).await?);
                }
                "server_array" => {
                    out.extend(instances_by_array_href(&environment, &resource_uri, prompt).await?);
                }
                other => return Err(Error::UnsupportedResourceType(other.to_string())),
            }
        }
    }
    Ok(())
}

/// Resolve a direct instance href into a handle.
///
/// The sensitive view (including the initial credential) is requested only
/// when not prompting for a login.
///
/// # Errors
///
/// Lookup failures are wrapped with the href.
pub async fn instance_by_href(
    environment: &Arc<Environment>,
    href: &str,
    prompt: bool,
) -> Result<Handle> {
    let client = environment.client()?;
    let instance = client
        .show_instance(href, View::for_prompt(prompt))
        .await
        .map_err(|err| Error::lookup("instance", href, err))?;
    Ok(Handle::new(instance, Arc::clone(environment)))
}

/// Resolve a server href to its current instance.
///
/// # Errors
///
/// Returns [`Error::NoCurrentInstance`] when the server's link table has no
/// `current_instance` relation.
pub async fn instance_by_server_href(
    environment: &Arc<Environment>,
    href: &str,
    prompt: bool,
) -> Result<Handle> {
    let client = environment.client()?;
    let server = client
        .show_server(href)
        .await
        .map_err(|err| Error::lookup("server", href, err))?;

    let Some(current) = server.links.find("current_instance") else {
        return Err(Error::NoCurrentInstance(href.to_string()));
    };
    let current = current.to_string();

    instance_by_href(environment, &current, prompt).await
}

/// Resolve a server-array href to one handle per current instance, all
/// sharing the array's environment.
///
/// A missing `current_instances` link is tolerated: the empty href is passed
/// through and the API's rejection (or empty collection) surfaces as-is.
///
/// # Errors
///
/// Lookup failures are wrapped with the href being fetched.
pub async fn instances_by_array_href(
    environment: &Arc<Environment>,
    href: &str,
    prompt: bool,
) -> Result<Vec<Handle>> {
    let client = environment.client()?;
    let array = client
        .show_server_array(href)
        .await
        .map_err(|err| Error::lookup("array", href, err))?;

    let collection = array
        .links
        .find("current_instances")
        .unwrap_or_default()
        .to_string();

    let instances = client
        .list_instances(&collection, View::for_prompt(prompt))
        .await
        .map_err(|err| Error::lookup("array instances", collection.clone(), err))?;

    Ok(instances
        .into_iter()
        .map(|instance| Handle::new(instance, Arc::clone(environment)))
        .collect())
}

/// Resolve an instance by its legacy numeric id within a cloud: fetch the
/// cloud's collection through the legacy generation and scan for the entry
/// whose legacy id matches.
///
/// # Errors
///
/// Returns [`Error::LegacyIdNotFound`] when no entry matches.
pub async fn instance_by_legacy_id(
    environment: &Arc<Environment>,
    cloud: u64,
    legacy_id: u64,
    prompt: bool,
) -> Result<Handle> {
    let client = environment.legacy_client()?;
    let collection = format!("/api/clouds/{cloud}/instances");
    let instances = client
        .list_instances(&collection)
        .await
        .map_err(|err| Error::lookup("instances", collection.clone(), err))?;

    for entry in instances {
        if entry.legacy_id == Some(legacy_id) {
            return instance_by_href(environment, &entry.href, prompt).await;
        }
    }

    Err(Error::LegacyIdNotFound(legacy_id))
}

/// Resolve a server page carrying an `instance_id` query: the target is the
/// server's *next* instance, located by legacy id in the cloud embedded in
/// the `next_instance` href.
async fn instance_by_next_instance(
    environment: &Arc<Environment>,
    href: &str,
    legacy_id: u64,
    prompt: bool,
) -> Result<Handle> {
    let client = environment.client()?;
    let server = client
        .show_server(href)
        .await
        .map_err(|err| Error::lookup("server", href, err))?;

    let Some(next) = server.links.find("next_instance") else {
        return Err(Error::NoNextInstance(href.to_string()));
    };

    let cloud = cloud_of_instance_href(next)
        .ok_or_else(|| Error::Parse(format!("unexpected next_instance href: {next}")))?;

    instance_by_legacy_id(environment, cloud, legacy_id, prompt).await
}
