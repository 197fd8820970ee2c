//! Warden permission engine.
//!
//! # Purpose
//! Declares fine-grained permissions as `(resource pattern, method) → key`
//! triples discovered from route tables, stores them with parent/child
//! grant edges, aggregates the permissions reachable from a caller's roles
//! and decides per request whether the caller may invoke a method + path.
//!
//! # How it fits
//! The hosting service registers its route tables at boot
//! ([`register_tables`]), seeds roles ([`seed_roles`]) and, for every
//! request, builds an [`AuthorizationContext`] with [`RoleAggregator`] and
//! asks [`Authorizer`] for a [`Decision`]. The crate has no HTTP dependency.
//!
//! # Key invariants
//! - Permission keys and role names are trimmed and lowercased.
//! - Registering the same key twice updates one entry; child edges are only
//!   ever added.
//! - Unknown resources answer 404 for every caller; anonymous callers get
//!   401 and never 403.
//! - Excluded permissions behave as if they were never declared.
//!
//! # Examples
//! ```rust
//! use warden_iam::{
//!     AccessRequest, Authorizer, Decision, Denial, ExclusionList, HttpMethod, Iam,
//!     MethodDescriptor, RoleAggregator, RoleDefinition, RouteTable, register_tables, seed_roles,
//! };
//!
//! let iam = Iam::new();
//! let users = RouteTable::new("/users").route(
//!     "/",
//!     HttpMethod::Get,
//!     MethodDescriptor::new("admin:list"),
//! );
//! register_tables(&iam, &[users], "", &ExclusionList::new()).unwrap();
//! seed_roles(&iam, &[RoleDefinition::new("admin").permissions(["admin:list"])]).unwrap();
//!
//! let authorizer = Authorizer::new(&iam);
//! let admin = RoleAggregator::new(&iam).permissions_for_roles(&["admin"]).unwrap();
//! let guest = RoleAggregator::new(&iam).permissions_for_roles(&["guest"]).unwrap();
//!
//! let list = AccessRequest::new("GET", "/users");
//! assert_eq!(authorizer.evaluate(&admin, &list).unwrap(), Decision::Allow);
//! assert_eq!(
//!     authorizer.evaluate(&guest, &list).unwrap(),
//!     Decision::Deny(Denial::Unauthenticated)
//! );
//! assert_eq!(
//!     authorizer.evaluate(&admin, &AccessRequest::new("GET", "/users/99")).unwrap(),
//!     Decision::Deny(Denial::NotFound)
//! );
//! ```
//!
//! # Common pitfalls
//! - Treating a catalog error as an allow; [`Authorizer::evaluate`] returns
//!   it so the caller can fail closed.
//! - Expecting scope narrowing to follow grandchildren; it pulls in one level.

mod aggregator;
mod authorize;
mod catalog;
mod context;
mod errors;
mod exclusion;
mod method;
mod pattern;
mod permission;
mod registry;
mod role;
mod route;
mod seed;

pub use aggregator::RoleAggregator;
pub use authorize::{AccessRequest, Authorizer, Decision, Denial, narrow_scope};
pub use catalog::{Iam, IamCatalog, RoleChanges};
pub use context::AuthorizationContext;
pub use errors::{IamError, IamResult};
pub use exclusion::{Exclusion, ExclusionList, ExclusionReason};
pub use method::HttpMethod;
pub use pattern::{ResourcePattern, normalize_template};
pub use permission::{Permission, PermissionId, PermissionMeta, normalize_groups, normalize_key};
pub use registry::PermissionRegistry;
pub use role::{GUEST_ROLE, Role, RoleDirectory, normalize_role, normalize_roles};
pub use route::{
    MethodDescriptor, RouteDescriptor, RouteEntry, RouteIndex, RouteTable, register_tables,
};
pub use seed::{PermissionRecord, RoleDefinition, import_permissions, seed_roles};
