//! Sandwich API types and request bodies.
//!
//! Snapshots are point-in-time reads of remote resources; each carries the
//! fields the drivers reconcile into local records, plus a `state` label
//! where the control plane reports one. Absent optional fields are
//! tolerated so older control planes stay readable.

use std::collections::HashMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A datacenter region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSnapshot {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Region name.
    pub name: String,
    /// Backing datacenter.
    pub datacenter: String,
    /// Datastore holding image files.
    pub image_datastore: String,
    /// Optional folder within the image datastore.
    #[serde(default)]
    pub image_folder: Option<String>,
    /// Whether the region accepts new workloads.
    #[serde(default)]
    pub schedulable: bool,
    /// Current state label.
    #[serde(default)]
    pub state: String,
}

/// A zone within a region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Zone name.
    pub name: String,
    /// Owning region.
    pub region_id: Uuid,
    /// Backing VM cluster.
    pub vm_cluster: String,
    /// Backing VM datastore.
    pub vm_datastore: String,
    /// Optional folder for VM placement.
    #[serde(default)]
    pub vm_folder: Option<String>,
    /// Core overprovisioning percentage.
    pub core_provision_percent: u32,
    /// RAM overprovisioning percentage.
    pub ram_provision_percent: u32,
    /// Whether the zone accepts new workloads.
    #[serde(default)]
    pub schedulable: bool,
    /// Current state label.
    #[serde(default)]
    pub state: String,
}

/// A layer-2 network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Network name (also its handle).
    pub name: String,
    /// Owning region name.
    pub region_name: String,
    /// Backing port group.
    pub port_group: String,
    /// Network CIDR.
    pub cidr: String,
    /// Gateway address.
    pub gateway: IpAddr,
    /// First allocatable address.
    pub pool_start: IpAddr,
    /// Last allocatable address.
    pub pool_end: IpAddr,
    /// DNS servers handed to instances.
    #[serde(default)]
    pub dns_servers: Vec<IpAddr>,
    /// Current state label.
    #[serde(default)]
    pub state: String,
}

/// A machine image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSnapshot {
    /// Server-assigned identifier, used for member grants.
    pub id: Uuid,
    /// Image name (also its handle within a project).
    pub name: String,
    /// Region the image file lives in.
    pub region_name: String,
    /// Backing file name.
    pub file_name: String,
    /// Current state label.
    #[serde(default)]
    pub state: String,
}

/// One project granted access to a shared image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMember {
    /// The project granted access.
    pub project_id: String,
}

/// Member list of a shared image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMemberList {
    /// The current grants.
    #[serde(default)]
    pub members: Vec<ImageMember>,
}

/// An SSH keypair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeypairSnapshot {
    /// Keypair name (also its handle within a project).
    pub name: String,
    /// Public key material.
    pub public_key: String,
}

/// An instance size preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlavorSnapshot {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Flavor name.
    pub name: String,
    /// Virtual CPU count.
    pub vcpus: u32,
    /// RAM in megabytes.
    pub ram: u32,
    /// Disk in gigabytes.
    pub disk: u32,
}

/// A compute instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Instance name.
    pub name: String,
    /// Source image.
    pub image_id: Uuid,
    /// Service account the instance runs as.
    #[serde(default)]
    pub service_account_id: Option<Uuid>,
    /// Network port wiring the instance into its network.
    pub network_port_id: Uuid,
    /// Owning region.
    pub region_id: Uuid,
    /// Placement zone, once scheduled.
    #[serde(default)]
    pub zone_id: Option<Uuid>,
    /// Size preset.
    pub flavor_id: Uuid,
    /// Root disk in gigabytes.
    pub disk: u32,
    /// Authorized keypairs.
    #[serde(default)]
    pub keypair_ids: Vec<Uuid>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Boot-time user data.
    #[serde(default)]
    pub user_data: Option<String>,
    /// Current state label.
    #[serde(default)]
    pub state: String,
}

/// A network port attaching an instance to a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkPortSnapshot {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// The attached network.
    pub network_id: Uuid,
}

/// A block storage volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSnapshot {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Volume name.
    pub name: String,
    /// Placement zone.
    pub zone_id: Uuid,
    /// Size in gigabytes.
    pub size: u32,
    /// Instance the volume is attached to, if any.
    #[serde(default)]
    pub attached_to: Option<Uuid>,
    /// Current state label.
    #[serde(default)]
    pub state: String,
    /// In-flight sub-operation label, if any. Distinct from `state`: a
    /// `Created` volume can still be `ATTACHING`.
    #[serde(default)]
    pub task: Option<String>,
}

impl VolumeSnapshot {
    /// Returns the task label, with the rest state as the empty string.
    #[must_use]
    pub fn task_label(&self) -> String {
        self.task.clone().unwrap_or_default()
    }
}

/// An IAM project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Project name (also its handle).
    pub name: String,
}

/// Resource quota of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Virtual CPU budget.
    pub vcpu: i64,
    /// RAM budget in megabytes.
    pub ram: i64,
    /// Disk budget in gigabytes.
    pub disk: i64,
}

/// A user membership in a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMemberSnapshot {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Member username.
    pub username: String,
    /// Authentication driver the username belongs to.
    pub driver: String,
    /// Roles granted to the member.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// An IAM role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSnapshot {
    /// Role name (also its handle within a scope).
    pub name: String,
    /// Permissions granted by the role.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Current state label.
    #[serde(default)]
    pub state: String,
}

/// An IAM service account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountSnapshot {
    /// Account name (also its handle within a scope).
    pub name: String,
    /// Server-assigned email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Current state label.
    #[serde(default)]
    pub state: String,
}

/// An IAM policy document: the single source of truth for role bindings
/// within a scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    /// The current bindings.
    #[serde(default)]
    pub bindings: Vec<PolicyBinding>,
}

/// One role-to-members binding within a policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyBinding {
    /// The bound role.
    pub role: String,
    /// Members granted the role.
    #[serde(default)]
    pub members: Vec<String>,
}

/// Request to create a compute instance.
#[derive(Debug, Clone, Serialize)]
pub struct CreateInstanceRequest {
    /// Instance name.
    pub name: String,
    /// Source image.
    pub image_id: Uuid,
    /// Network to attach to.
    pub network_id: Uuid,
    /// Region to create in.
    pub region_id: Uuid,
    /// Size preset.
    pub flavor_id: Uuid,
    /// Placement zone preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<Uuid>,
    /// Service account to run as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_id: Option<Uuid>,
    /// Root disk override in gigabytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<u32>,
    /// Authorized keypairs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keypair_ids: Vec<Uuid>,
    /// Free-form tags.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    /// Boot-time user data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

impl CreateInstanceRequest {
    /// Creates a request with the required placement fields.
    #[must_use]
    pub fn new(
        name: &str,
        image_id: Uuid,
        network_id: Uuid,
        region_id: Uuid,
        flavor_id: Uuid,
    ) -> Self {
        Self {
            name: name.to_string(),
            image_id,
            network_id,
            region_id,
            flavor_id,
            zone_id: None,
            service_account_id: None,
            disk: None,
            keypair_ids: Vec::new(),
            tags: HashMap::new(),
            user_data: None,
        }
    }

    /// Pins the instance to a zone.
    #[must_use]
    pub const fn with_zone(mut self, zone_id: Uuid) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    /// Runs the instance as a service account.
    #[must_use]
    pub const fn with_service_account(mut self, service_account_id: Uuid) -> Self {
        self.service_account_id = Some(service_account_id);
        self
    }

    /// Overrides the root disk size.
    #[must_use]
    pub const fn with_disk(mut self, disk: u32) -> Self {
        self.disk = Some(disk);
        self
    }

    /// Authorizes keypairs on the instance.
    #[must_use]
    pub fn with_keypairs(mut self, keypair_ids: Vec<Uuid>) -> Self {
        self.keypair_ids = keypair_ids;
        self
    }

    /// Sets free-form tags.
    #[must_use]
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets boot-time user data.
    #[must_use]
    pub fn with_user_data(mut self, user_data: &str) -> Self {
        self.user_data = Some(user_data.to_string());
        self
    }
}
