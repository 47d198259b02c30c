//! The OAuth-style authorization relationship kind.
//!
//! Models a user granting an application access: the `user` and
//! `application` roles each bind one identity, the relationship carries
//! the label "authorized", and the issued tokens live in the attribute
//! bag.

use idgraph_core::IdentityManager;
use idgraph_store::PersistenceBackend;
use idgraph_types::{
    bind_role, AttributeMap, Cardinality, Identity, IdentityKind, QueryParameter, Relationship,
    RelationshipKind, Result, RoleBindings,
};

/// Type id of the authorization kind.
pub const AUTHORIZATION: &str = "authorization";

/// The granting user.
pub const USER: QueryParameter = QueryParameter::scoped_role(AUTHORIZATION, "user");

/// The application being granted access.
pub const APPLICATION: QueryParameter = QueryParameter::scoped_role(AUTHORIZATION, "application");

/// The issued access token.
pub const ACCESS_TOKEN: QueryParameter =
    QueryParameter::scoped_attribute(AUTHORIZATION, "accessToken");

/// The one-time authorization code.
pub const AUTHORIZATION_CODE: QueryParameter =
    QueryParameter::scoped_attribute(AUTHORIZATION, "authorizationCode");

/// The issued refresh token.
pub const REFRESH_TOKEN: QueryParameter =
    QueryParameter::scoped_attribute(AUTHORIZATION, "refreshToken");

/// The schema descriptor for the authorization kind.
pub fn authorization_kind() -> RelationshipKind {
    RelationshipKind::builder(AUTHORIZATION)
        .role("user", Cardinality::One)
        .role("application", Cardinality::One)
        .build()
}

/// Create a user identity carrying a `loginName` attribute.
pub fn create_user<B: PersistenceBackend>(
    manager: &IdentityManager<B>,
    login_name: &str,
) -> Result<Identity> {
    let mut attributes = AttributeMap::new();
    attributes.set("loginName", login_name);
    manager.create_identity(IdentityKind::User, attributes)
}

/// Create an application (agent) identity carrying a `name` attribute.
pub fn create_application<B: PersistenceBackend>(
    manager: &IdentityManager<B>,
    name: &str,
) -> Result<Identity> {
    let mut attributes = AttributeMap::new();
    attributes.set("name", name);
    manager.create_identity(IdentityKind::Agent, attributes)
}

/// Record that `user` authorized `application`, issuing the given
/// tokens. The relationship is labelled "authorized".
pub fn authorize<B: PersistenceBackend>(
    manager: &IdentityManager<B>,
    user_id: &str,
    application_id: &str,
    authorization_code: &str,
    access_token: &str,
    refresh_token: &str,
) -> Result<Relationship> {
    let mut bindings = RoleBindings::new();
    bind_role(&mut bindings, "user", user_id);
    bind_role(&mut bindings, "application", application_id);

    let mut attributes = AttributeMap::new();
    attributes.set("authorizationCode", authorization_code);
    attributes.set("accessToken", access_token);
    attributes.set("refreshToken", refresh_token);

    manager.add_relationship(
        AUTHORIZATION,
        bindings,
        Some("authorized".to_string()),
        attributes,
    )
}
