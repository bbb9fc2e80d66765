//! Common test utilities and helpers for integration tests.
//!
//! Spawns the application over the in-memory reference stores on an ephemeral
//! port and mints session tokens the way the external auth service would, so
//! every test drives the real HTTP surface.

#![allow(dead_code)]

use jwt_simple::prelude::*;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

use turnstile::auth::{SessionClaims, SessionVerifier};
use turnstile::effects::SideEffectHandle;
use turnstile::models::{AuditEntry, DirectoryUser, Role};
use turnstile::notify::Notification;
use turnstile::store::{AuditStore, MemoryStore, NotificationStore};
use turnstile::{create_router, AppState, Config, Stores};

/// Stand-in for the external session provider's signing key.
static SESSION_KEY_PAIR: Lazy<Ed25519KeyPair> = Lazy::new(Ed25519KeyPair::generate);

const TEST_ISSUER: &str = "turnstile-test";

/// A test application instance with its own HTTP client and base URL. The
/// backing [`MemoryStore`] stays accessible for inspecting audit entries and
/// notification inboxes.
pub struct TestApp {
    pub client: Client,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    _effects: SideEffectHandle,
}

/// An authenticated caller: the id baked into the token plus the token itself.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

/// Signs a session token for the given identity, as the auth service would.
pub fn mint_token(user_id: Uuid, name: &str, role: Role, branch_id: Option<Uuid>) -> String {
    let claims = Claims::with_custom_claims(
        SessionClaims {
            name: name.to_string(),
            role,
            branch_id,
        },
        Duration::from_hours(1),
    )
    .with_subject(user_id.to_string())
    .with_issuer(TEST_ISSUER);

    SESSION_KEY_PAIR.sign(claims).expect("Failed to sign token")
}

pub fn super_admin() -> TestUser {
    let id = Uuid::new_v4();
    TestUser {
        token: mint_token(id, "Root Admin", Role::SuperAdmin, None),
        id,
    }
}

pub fn branch_admin(branch: Uuid) -> TestUser {
    let id = Uuid::new_v4();
    TestUser {
        token: mint_token(id, "Branch Admin", Role::BranchAdmin, Some(branch)),
        id,
    }
}

pub fn gym_member(branch: Uuid) -> TestUser {
    let id = Uuid::new_v4();
    TestUser {
        token: mint_token(id, "Gym Member", Role::Member, Some(branch)),
        id,
    }
}

impl TestApp {
    /// Spawns a new test application on an ephemeral port with a fresh
    /// in-memory store.
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::spawn_with_stores(Stores::in_memory(store.clone()), store).await
    }

    /// Spawns with custom collaborator wiring. `store` stays the inspectable
    /// backing instance; individual seams can be swapped for failing doubles.
    pub async fn spawn_with_stores(stores: Stores, store: Arc<MemoryStore>) -> Self {
        use base64::Engine;

        let public_key_b64 = base64::engine::general_purpose::STANDARD
            .encode(SESSION_KEY_PAIR.public_key().to_bytes());
        let verifier = SessionVerifier::from_public_key_b64(
            &public_key_b64,
            Some(TEST_ISSUER.to_string()),
            None,
        )
        .expect("Failed to build session verifier");

        let config = Config::default_for_testing();
        let (state, effects) = AppState::new(stores, verifier, &config);
        let app = create_router(state, &config);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{}", addr),
            store,
            _effects: effects,
        }
    }

    /// Registers a branch admin in the directory and returns a caller minted
    /// for that identity, so the admin both receives fan-out and can call the
    /// API.
    pub async fn register_branch_admin(&self, branch: Uuid, name: &str) -> TestUser {
        let id = Uuid::new_v4();
        self.store
            .add_directory_user(DirectoryUser {
                id,
                display_name: name.to_string(),
                role: Role::BranchAdmin,
                branch_id: Some(branch),
            })
            .await;

        TestUser {
            token: mint_token(id, name, Role::BranchAdmin, Some(branch)),
            id,
        }
    }

    /// Creates a member through the API and returns its id.
    pub async fn create_member_in(
        &self,
        caller: &TestUser,
        branch: Uuid,
        name: &str,
        email: &str,
    ) -> Uuid {
        let response = self
            .post(
                "/members",
                &caller.token,
                json!({
                    "full_name": name,
                    "email": email,
                    "branch_id": branch
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "member setup failed");

        let body: Value = response.json().await.expect("Failed to parse response");
        Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
    }

    /// Creates a lead through the API and returns its id.
    pub async fn create_lead_in(
        &self,
        caller: &TestUser,
        branch: Uuid,
        name: &str,
        phone: &str,
    ) -> Uuid {
        let response = self
            .post(
                "/leads",
                &caller.token,
                json!({
                    "full_name": name,
                    "phone": phone,
                    "branch_id": branch
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "lead setup failed");

        let body: Value = response.json().await.expect("Failed to parse response");
        Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
    }

    pub async fn audit_entries(&self, branch: Option<Uuid>) -> Vec<AuditEntry> {
        AuditStore::list(&*self.store, branch)
            .await
            .expect("Failed to list audit entries")
    }

    pub async fn inbox(&self, recipient: Uuid) -> Vec<Notification> {
        NotificationStore::list_for(&*self.store, recipient)
            .await
            .expect("Failed to list notifications")
    }

    /// Polls until at least `count` audit entries exist for `branch`. Audit
    /// runs on the side-effect worker, so successful mutations become visible
    /// asynchronously.
    pub async fn wait_for_audit(&self, branch: Option<Uuid>, count: usize) -> Vec<AuditEntry> {
        for _ in 0..80 {
            let entries = self.audit_entries(branch).await;
            if entries.len() >= count {
                return entries;
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
        panic!("Timed out waiting for {} audit entries", count);
    }

    /// Polls until `recipient`'s inbox holds at least `count` notifications.
    pub async fn wait_for_inbox(&self, recipient: Uuid, count: usize) -> Vec<Notification> {
        for _ in 0..80 {
            let inbox = self.inbox(recipient).await;
            if inbox.len() >= count {
                return inbox;
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
        panic!("Timed out waiting for {} notifications", count);
    }

    /// Gives the side-effect worker time to run, then asserts no audit entry
    /// exists and none of `admins` received a notification.
    pub async fn assert_no_side_effects(&self, admins: &[&TestUser]) {
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        assert!(
            self.audit_entries(None).await.is_empty(),
            "Expected zero audit entries"
        );
        for admin in admins {
            assert!(
                self.inbox(admin.id).await.is_empty(),
                "Expected empty inbox for {}",
                admin.id
            );
        }
    }

    /// Makes an authenticated GET request.
    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send GET request")
    }

    /// Makes an authenticated POST request with JSON body.
    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to send POST request")
    }

    /// Makes an authenticated PUT request with JSON body.
    pub async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to send PUT request")
    }

    /// Makes an authenticated DELETE request.
    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send DELETE request")
    }

    /// Makes an unauthenticated GET request.
    pub async fn get_public(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to send GET request")
    }
}

/// Asserts that a response has a specific status code.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $expected:expr) => {
        assert_eq!(
            $response.status().as_u16(),
            $expected,
            "Expected status {}, got {}",
            $expected,
            $response.status()
        );
    };
}
