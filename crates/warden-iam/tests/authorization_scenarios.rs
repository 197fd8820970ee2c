use std::sync::Arc;
use warden_iam::{
    AccessRequest, AuthorizationContext, Authorizer, Decision, Denial, ExclusionList, HttpMethod,
    Iam, IamCatalog, IamError, IamResult, MethodDescriptor, Permission, PermissionId, Role,
    RoleAggregator, RoleDefinition, RouteTable, register_tables, seed_roles,
};

fn context(iam: &Iam, roles: &[&str]) -> AuthorizationContext {
    RoleAggregator::new(iam)
        .permissions_for_roles(roles)
        .expect("aggregate")
}

fn decide(iam: &Iam, roles: &[&str], method: &str, path: &str, required: &[String]) -> Decision {
    Authorizer::new(iam)
        .evaluate(
            &context(iam, roles),
            &AccessRequest::new(method, path).requiring(required),
        )
        .expect("evaluate")
}

fn users_fixture() -> Iam {
    let iam = Iam::new();
    let users =
        RouteTable::new("/users").route("/", HttpMethod::Get, MethodDescriptor::new("admin:list"));
    register_tables(&iam, &[users], "", &ExclusionList::new()).expect("register");
    seed_roles(
        &iam,
        &[
            RoleDefinition::new("guest").protected(),
            RoleDefinition::new("admin").permissions(["admin:list"]),
            RoleDefinition::new("support"),
        ],
    )
    .expect("seed");
    iam
}

#[test]
fn admin_list_scenario() {
    let iam = users_fixture();
    let required = vec!["admin:list".to_string()];

    assert_eq!(decide(&iam, &["admin"], "GET", "/users", &required), Decision::Allow);
    assert_eq!(
        decide(&iam, &["guest"], "GET", "/users", &required),
        Decision::Deny(Denial::Unauthenticated)
    );
    for roles in [&["admin"][..], &["guest"][..], &["support"][..], &[][..]] {
        assert_eq!(
            decide(&iam, roles, "GET", "/users/99", &[]),
            Decision::Deny(Denial::NotFound),
            "roles {roles:?}"
        );
    }
}

#[test]
fn authenticated_caller_without_key_is_forbidden() {
    let iam = users_fixture();
    assert_eq!(
        decide(&iam, &["support"], "GET", "/users", &["admin:list".to_string()]),
        Decision::Deny(Denial::Forbidden)
    );
    assert_eq!(
        decide(&iam, &["support", "guest"], "GET", "/users", &[]),
        Decision::Deny(Denial::Forbidden)
    );
}

#[test]
fn child_grant_is_inherited() {
    let iam = Iam::new();
    let docs = RouteTable::new("/docs")
        .route("/", HttpMethod::Get, MethodDescriptor::new("docs:read"))
        .route(
            "/v2/:docId",
            HttpMethod::Get,
            MethodDescriptor::new("docs:read:v2").parents(["docs:read"]),
        );
    register_tables(&iam, &[docs], "/api", &ExclusionList::new()).expect("register");
    seed_roles(&iam, &[RoleDefinition::new("viewer").permissions(["docs:read"])]).expect("seed");

    assert_eq!(
        decide(
            &iam,
            &["viewer"],
            "GET",
            "/api/docs/v2/intro",
            &["docs:read:v2".to_string()]
        ),
        Decision::Allow
    );
}

#[test]
fn excluded_permission_is_not_found_even_for_holder() {
    let iam = Iam::new();
    let reports = RouteTable::new("/reports").route(
        "/export",
        HttpMethod::Get,
        MethodDescriptor::new("reports:export"),
    );
    let exclusions = ExclusionList::parse("reports:export\n");
    register_tables(&iam, &[reports], "/api", &exclusions).expect("register");
    seed_roles(&iam, &[RoleDefinition::new("analyst").permissions(["reports:export"])])
        .expect("seed");

    let context = context(&iam, &["analyst"]);
    assert!(context.holds("reports:export"));
    assert_eq!(
        decide(
            &iam,
            &["analyst"],
            "GET",
            "/api/reports/export",
            &["reports:export".to_string()]
        ),
        Decision::Deny(Denial::NotFound)
    );
    assert_eq!(
        decide(&iam, &["guest"], "GET", "/api/reports/export", &[]),
        Decision::Deny(Denial::NotFound)
    );
}

#[test]
fn reregistering_descriptors_keeps_one_entry_per_pair() {
    let iam = Iam::new();
    let table = RouteTable::new("/users")
        .route("/", HttpMethod::Get, MethodDescriptor::new("users:list"))
        .route("/:userId", HttpMethod::Get, MethodDescriptor::new("users:get"));
    register_tables(&iam, &[table.clone()], "/api", &ExclusionList::new()).expect("first");
    register_tables(&iam, &[table.clone(), table], "/api", &ExclusionList::new()).expect("again");

    let all = iam.registry().find_all();
    assert_eq!(all.len(), 2);
    let mut pairs: Vec<(String, Option<HttpMethod>)> = all
        .iter()
        .map(|p| (p.resource.as_ref().map(|r| r.to_string()).unwrap_or_default(), p.method))
        .collect();
    pairs.sort();
    pairs.dedup();
    assert_eq!(pairs.len(), 2);
}

#[test]
fn role_edit_changes_access_on_next_request() {
    let iam = users_fixture();
    assert_eq!(
        decide(&iam, &["support"], "GET", "/users", &[]),
        Decision::Deny(Denial::Forbidden)
    );
    iam.replace_role_permissions("support", &["admin:list"])
        .expect("replace");
    assert_eq!(decide(&iam, &["support"], "GET", "/users", &[]), Decision::Allow);
}

struct OfflineCatalog {
    inner: Iam,
}

impl IamCatalog for OfflineCatalog {
    fn roles_by_names(&self, names: &[String]) -> IamResult<Vec<Arc<Role>>> {
        self.inner.roles_by_names(names)
    }

    fn resolve_children(&self, roots: &[PermissionId]) -> IamResult<Vec<Arc<Permission>>> {
        self.inner.resolve_children(roots)
    }

    fn all_permissions(&self) -> IamResult<Vec<Arc<Permission>>> {
        Err(IamError::RegistryRead("connection reset".to_string()))
    }
}

#[test]
fn storage_failure_fails_closed() {
    let catalog = OfflineCatalog {
        inner: users_fixture(),
    };
    let context = RoleAggregator::new(&catalog)
        .permissions_for_roles(&["support"])
        .expect("aggregate");
    let result = Authorizer::new(&catalog).evaluate(&context, &AccessRequest::new("GET", "/users"));
    assert!(matches!(result, Err(IamError::RegistryRead(_))));

    let admin = RoleAggregator::new(&catalog)
        .permissions_for_roles(&["admin"])
        .expect("aggregate");
    let granted = Authorizer::new(&catalog)
        .evaluate(&admin, &AccessRequest::new("GET", "/users"))
        .expect("held permissions need no registry scan");
    assert_eq!(granted, Decision::Allow);
}
