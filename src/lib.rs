// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Sandwich Provision
//!
//! A declarative resource provisioning plugin for the Sandwich Cloud
//! control plane.
//!
//! ## Overview
//!
//! The crate maps declarative resource records — regions, zones, networks,
//! images, instances, volumes, keypairs, projects and IAM objects — onto
//! CRUD and lifecycle-action calls against the Sandwich API, and waits for
//! each mutation to converge:
//!
//! - Create/Read/Update/Delete hooks per resource kind, invoked by an
//!   external declarative engine one record at a time
//! - A generic asynchronous state waiter that polls a resource until it
//!   reaches a target state, with uniform absence, timeout and
//!   unexpected-state handling
//! - Scope-keyed locking for IAM policy read-modify-write cycles
//!
//! ## Architecture
//!
//! Control flows driver → client → waiter and back:
//!
//! 1. **Driver**: issues the mutating call and records the handle
//! 2. **Waiter**: polls the resource's state label until it converges
//! 3. **Driver**: reads the fresh snapshot back into the local record
//!
//! ## Modules
//!
//! - [`config`]: provider configuration and session bootstrap
//! - [`client`]: the Sandwich API client and wire types
//! - [`waiter`]: the generic state-transition waiter
//! - [`states`]: state labels and per-kind poll templates
//! - [`resources`]: per-kind lifecycle drivers
//! - [`iam`]: scope-keyed locking for policy edits
//! - [`identity`]: handles and composite identifiers
//! - [`error`]: the error hierarchy
//!
//! ## Example
//!
//! ```no_run
//! use sandwich_provision::{Provider, ProviderConfig, ResourceLifecycle, VolumeRecord};
//!
//! # async fn run() -> sandwich_provision::Result<()> {
//! let provider = Provider::connect(
//!     ProviderConfig::new("https://sandwich.example.com", "token").with_project("web"),
//! )
//! .await?;
//!
//! let mut volume = VolumeRecord {
//!     name: String::from("data"),
//!     size: 10,
//!     ..VolumeRecord::default()
//! };
//! provider.volumes().create(&mut volume).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod iam;
pub mod identity;
pub mod logging;
pub mod resources;
pub mod states;
pub mod waiter;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::SandwichClient;
pub use config::{Provider, ProviderConfig};
pub use error::{ApiError, ConfigError, IdentifierError, ProvisionError, Result, WaitError};
pub use iam::{IamScope, KeyedMutex};
pub use identity::{ImageMemberId, PolicyBindingId, PolicyMemberId, ResourceHandle};
pub use logging::{init_logging, try_init_logging};
pub use resources::{ReadOutcome, ResourceLifecycle};
pub use resources::flavor::{FlavorDriver, FlavorRecord};
pub use resources::image::{ImageDriver, ImageRecord};
pub use resources::image_member::{ImageMemberDriver, ImageMemberRecord};
pub use resources::instance::{InstanceDriver, InstanceRecord};
pub use resources::keypair::{KeypairDriver, KeypairRecord};
pub use resources::network::{NetworkDriver, NetworkRecord};
pub use resources::policy::{PolicyDriver, PolicyRecord};
pub use resources::policy_binding::{PolicyBindingDriver, PolicyBindingRecord};
pub use resources::policy_member::{PolicyMemberDriver, PolicyMemberRecord};
pub use resources::project::{ProjectDriver, ProjectRecord};
pub use resources::project_member::{ProjectMemberDriver, ProjectMemberRecord};
pub use resources::project_quota::{ProjectQuotaDriver, ProjectQuotaRecord};
pub use resources::region::{RegionDriver, RegionRecord};
pub use resources::role::{RoleDriver, RoleRecord};
pub use resources::service_account::{ServiceAccountDriver, ServiceAccountRecord};
pub use resources::volume::{VolumeDriver, VolumeRecord};
pub use resources::zone::{ZoneDriver, ZoneRecord};
pub use states::{Operation, PollTemplate, ResourceKind, TaskAction, poll_template, task_template};
pub use waiter::{PollSpec, WaitSettings, await_state};
