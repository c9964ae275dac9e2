//! In-memory doubles for the external collaborators.
//!
//! The integration tests drive the full router against these instead of a
//! live provider, database, or processor.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::auth_provider::{AuthProvider, ProviderSession, ProviderUser, UserUpdate};
use super::bridge::{BridgeMessage, SessionSink};
use super::error::ServiceError;
use super::paddle::{
    AddressUpdate, BillingProcessor, CustomerUpdate, PaddleAddress, PaddleCustomer,
    PortalGeneralUrls, PortalSession, PortalUrls,
};
use super::profiles::ProfileStore;
use crate::models::{Language, NewProfile, UserProfile, VerifyKind};
use crate::utils::jwt::encode_unsigned_token;

#[derive(Clone)]
struct MockAccount {
    id: Uuid,
    email: String,
    password: String,
    confirmed: bool,
    pending_email: Option<String>,
}

/// Authentication provider double. Tokens are unsigned but structurally
/// valid, so claim decoding behaves like it does against the real provider.
#[derive(Default)]
pub struct MockAuthProvider {
    accounts: Mutex<HashMap<Uuid, MockAccount>>,
    token_hashes: Mutex<HashMap<String, Uuid>>,
    verify_calls: AtomicUsize,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a confirmed account directly.
    pub fn add_account(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.accounts.lock().unwrap().insert(
            id,
            MockAccount {
                id,
                email: email.to_string(),
                password: password.to_string(),
                confirmed: true,
                pending_email: None,
            },
        );
        id
    }

    /// Make a single-use verification token hash for the given account.
    pub fn issue_token_hash(&self, token_hash: &str, email: &str) {
        let id = self
            .id_for(email)
            .expect("issue_token_hash: unknown account");
        self.token_hashes
            .lock()
            .unwrap()
            .insert(token_hash.to_string(), id);
    }

    pub fn id_for(&self, email: &str) -> Option<Uuid> {
        self.accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .map(|a| a.id)
    }

    /// Access token for an existing account, as the provider would mint it.
    pub fn access_token_for(&self, email: &str) -> Option<String> {
        let accounts = self.accounts.lock().unwrap();
        accounts
            .values()
            .find(|a| a.email == email)
            .map(Self::access_token)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn email_of(&self, id: Uuid) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .get(&id)
            .map(|a| a.email.clone())
    }

    fn access_token(account: &MockAccount) -> String {
        encode_unsigned_token(
            &account.id.to_string(),
            &account.email,
            Utc::now().timestamp() + 3600,
        )
    }

    fn session(account: &MockAccount) -> ProviderSession {
        ProviderSession {
            access_token: Self::access_token(account),
            refresh_token: format!("refresh-{}", account.id),
            expires_in: Some(3600),
            user: Some(Self::user(account)),
        }
    }

    fn user(account: &MockAccount) -> ProviderUser {
        ProviderUser {
            id: account.id,
            email: Some(account.email.clone()),
            email_confirmed_at: account.confirmed.then(Utc::now),
        }
    }

    fn account_for_token(&self, access_token: &str) -> Option<MockAccount> {
        let claims = crate::utils::jwt::decode_access_claims(access_token).ok()?;
        let id = Uuid::parse_str(&claims.sub).ok()?;
        self.accounts.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _redirect_to: &str,
    ) -> Result<ProviderUser, ServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.email == email) {
            return Err(ServiceError::Provider {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let id = Uuid::new_v4();
        let account = MockAccount {
            id,
            email: email.to_string(),
            password: password.to_string(),
            confirmed: false,
            pending_email: None,
        };
        let user = Self::user(&account);
        accounts.insert(id, account);
        Ok(user)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ServiceError> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .values()
            .find(|a| a.email == email && a.password == password)
            .ok_or_else(|| ServiceError::Provider {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })?;

        if !account.confirmed {
            return Err(ServiceError::Provider {
                status: 400,
                message: "Email not confirmed".to_string(),
            });
        }

        Ok(Self::session(account))
    }

    async fn sign_in_with_otp(&self, _email: &str) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ServiceError> {
        self.account_for_token(access_token)
            .map(|a| Self::user(&a))
            .ok_or_else(|| ServiceError::Provider {
                status: 401,
                message: "invalid JWT".to_string(),
            })
    }

    async fn verify_otp(
        &self,
        token_hash: &str,
        kind: VerifyKind,
    ) -> Result<ProviderSession, ServiceError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        // Tokens are single-use: a second consumption always fails.
        let id = self.token_hashes.lock().unwrap().remove(token_hash);
        let Some(id) = id else {
            return Err(ServiceError::Provider {
                status: 403,
                message: "Email link is invalid or has expired".to_string(),
            });
        };

        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(&id).ok_or_else(|| ServiceError::Provider {
            status: 403,
            message: "Email link is invalid or has expired".to_string(),
        })?;

        account.confirmed = true;
        if kind == VerifyKind::EmailChange {
            if let Some(pending) = account.pending_email.take() {
                account.email = pending;
            }
        }

        Ok(Self::session(account))
    }

    async fn update_user(
        &self,
        access_token: &str,
        update: UserUpdate,
    ) -> Result<ProviderUser, ServiceError> {
        let account = self
            .account_for_token(access_token)
            .ok_or_else(|| ServiceError::Provider {
                status: 401,
                message: "invalid JWT".to_string(),
            })?;

        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(&account.id).expect("account exists");

        if let Some(email) = update.email {
            // Email changes stay pending until the confirmation token is
            // consumed, like the real provider.
            account.pending_email = Some(email);
        }
        if let Some(password) = update.password {
            account.password = password;
        }

        Ok(Self::user(account))
    }

    async fn reset_password_for_email(
        &self,
        _email: &str,
        _redirect_to: &str,
    ) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Profile store double with switchable failure points.
#[derive(Default)]
pub struct InMemoryProfileStore {
    rows: Mutex<HashMap<Uuid, UserProfile>>,
    pub fail_insert: AtomicBool,
    pub fail_update_name: AtomicBool,
    pub fail_update_email: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, profile: UserProfile) {
        self.rows.lock().unwrap().insert(profile.id, profile);
    }

    pub fn get(&self, id: Uuid) -> Option<UserProfile> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    /// Minimal profile row for seeding.
    pub fn profile(id: Uuid, email: &str) -> UserProfile {
        let now = Utc::now();
        UserProfile {
            id,
            email: email.to_string(),
            email_confirmed: true,
            language: None,
            name: String::new(),
            marketing_consent: false,
            subscription_plan: "Free".to_string(),
            paddle_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn with_row<F>(&self, id: Uuid, f: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&id).ok_or(ServiceError::ProfileNotFound)?;
        f(row);
        row.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find(&self, id: Uuid) -> Result<Option<UserProfile>, ServiceError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, profile: NewProfile) -> Result<(), ServiceError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "profile insert failed"
            )));
        }

        let now = Utc::now();
        self.rows.lock().unwrap().insert(
            profile.id,
            UserProfile {
                id: profile.id,
                email: profile.email,
                email_confirmed: false,
                language: None,
                name: profile.name,
                marketing_consent: profile.marketing_consent,
                subscription_plan: profile.subscription_plan,
                paddle_customer_id: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<(), ServiceError> {
        if self.fail_update_name.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "profile name update failed"
            )));
        }
        self.with_row(id, |row| row.name = name.to_string())
    }

    async fn update_email(&self, id: Uuid, email: &str) -> Result<(), ServiceError> {
        if self.fail_update_email.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "profile email update failed"
            )));
        }
        self.with_row(id, |row| {
            row.email = email.to_string();
            row.email_confirmed = true;
        })
    }

    async fn update_language(&self, id: Uuid, language: Language) -> Result<(), ServiceError> {
        self.with_row(id, |row| row.language = Some(language.as_str().to_string()))
    }

    async fn update_marketing_consent(&self, id: Uuid, consent: bool) -> Result<(), ServiceError> {
        self.with_row(id, |row| row.marketing_consent = consent)
    }
}

/// Billing processor double that counts every call, so tests can assert
/// which steps ran.
#[derive(Default)]
pub struct MockBillingProcessor {
    customers: Mutex<HashMap<String, PaddleCustomer>>,
    addresses: Mutex<HashMap<String, Vec<PaddleAddress>>>,
    next_address_id: AtomicUsize,
    pub fail_update_customer: AtomicBool,
    pub fail_update_address: AtomicBool,
    get_customer_calls: AtomicUsize,
    update_customer_calls: AtomicUsize,
    list_addresses_calls: AtomicUsize,
    create_address_calls: AtomicUsize,
    update_address_calls: AtomicUsize,
    portal_session_calls: AtomicUsize,
}

impl MockBillingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_customer(&self, id: &str, name: &str) {
        self.customers.lock().unwrap().insert(
            id.to_string(),
            PaddleCustomer {
                id: id.to_string(),
                name: Some(name.to_string()),
                email: None,
                status: Some("active".to_string()),
            },
        );
    }

    pub fn seed_address(&self, customer_id: &str, address: PaddleAddress) {
        self.addresses
            .lock()
            .unwrap()
            .entry(customer_id.to_string())
            .or_default()
            .push(address);
    }

    pub fn customer(&self, id: &str) -> Option<PaddleCustomer> {
        self.customers.lock().unwrap().get(id).cloned()
    }

    pub fn addresses_of(&self, customer_id: &str) -> Vec<PaddleAddress> {
        self.addresses
            .lock()
            .unwrap()
            .get(customer_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_customer_calls(&self) -> usize {
        self.get_customer_calls.load(Ordering::SeqCst)
    }

    pub fn update_customer_calls(&self) -> usize {
        self.update_customer_calls.load(Ordering::SeqCst)
    }

    pub fn create_address_calls(&self) -> usize {
        self.create_address_calls.load(Ordering::SeqCst)
    }

    pub fn update_address_calls(&self) -> usize {
        self.update_address_calls.load(Ordering::SeqCst)
    }

    pub fn portal_session_calls(&self) -> usize {
        self.portal_session_calls.load(Ordering::SeqCst)
    }

    fn not_found() -> ServiceError {
        ServiceError::Billing {
            status: 404,
            message: "not_found: entity does not exist".to_string(),
        }
    }
}

#[async_trait]
impl BillingProcessor for MockBillingProcessor {
    async fn get_customer(&self, customer_id: &str) -> Result<PaddleCustomer, ServiceError> {
        self.get_customer_calls.fetch_add(1, Ordering::SeqCst);
        self.customer(customer_id).ok_or_else(Self::not_found)
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<PaddleCustomer, ServiceError> {
        self.update_customer_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_update_customer.load(Ordering::SeqCst) {
            return Err(ServiceError::Billing {
                status: 500,
                message: "internal: customer update failed".to_string(),
            });
        }

        let mut customers = self.customers.lock().unwrap();
        let customer = customers
            .get_mut(customer_id)
            .ok_or_else(Self::not_found)?;
        if let Some(name) = update.name {
            customer.name = Some(name);
        }
        if let Some(email) = update.email {
            customer.email = Some(email);
        }
        Ok(customer.clone())
    }

    async fn list_addresses(&self, customer_id: &str) -> Result<Vec<PaddleAddress>, ServiceError> {
        self.list_addresses_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.addresses_of(customer_id))
    }

    async fn create_address(
        &self,
        customer_id: &str,
        address: AddressUpdate,
    ) -> Result<PaddleAddress, ServiceError> {
        self.create_address_calls.fetch_add(1, Ordering::SeqCst);

        let n = self.next_address_id.fetch_add(1, Ordering::SeqCst);
        let created = PaddleAddress {
            id: format!("add_{}", n),
            first_line: Some(address.first_line),
            second_line: address.second_line,
            city: Some(address.city),
            region: Some(address.region),
            postal_code: Some(address.postal_code),
            country_code: Some(address.country_code),
            status: Some(address.status),
        };
        self.addresses
            .lock()
            .unwrap()
            .entry(customer_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update_address(
        &self,
        customer_id: &str,
        address_id: &str,
        address: AddressUpdate,
    ) -> Result<PaddleAddress, ServiceError> {
        self.update_address_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_update_address.load(Ordering::SeqCst) {
            return Err(ServiceError::Billing {
                status: 500,
                message: "internal: address update failed".to_string(),
            });
        }

        let mut addresses = self.addresses.lock().unwrap();
        let list = addresses
            .get_mut(customer_id)
            .ok_or_else(Self::not_found)?;
        let existing = list
            .iter_mut()
            .find(|a| a.id == address_id)
            .ok_or_else(Self::not_found)?;

        existing.first_line = Some(address.first_line);
        existing.second_line = address.second_line;
        existing.city = Some(address.city);
        existing.region = Some(address.region);
        existing.postal_code = Some(address.postal_code);
        existing.country_code = Some(address.country_code);
        existing.status = Some(address.status);
        Ok(existing.clone())
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
    ) -> Result<PortalSession, ServiceError> {
        self.portal_session_calls.fetch_add(1, Ordering::SeqCst);

        if self.customer(customer_id).is_none() {
            return Err(Self::not_found());
        }

        Ok(PortalSession {
            id: format!("pts_{}", customer_id),
            urls: Some(PortalUrls {
                general: Some(PortalGeneralUrls {
                    overview: Some(format!("https://billing.test/portal/{}", customer_id)),
                }),
            }),
        })
    }
}

/// Sink that records every outbound bridge message.
#[derive(Default)]
pub struct RecordingSessionSink {
    messages: Mutex<Vec<BridgeMessage>>,
}

impl RecordingSessionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<BridgeMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<BridgeMessage> {
        self.messages.lock().unwrap().last().cloned()
    }

    pub fn cleared_count(&self) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.is_cleared())
            .count()
    }
}

#[async_trait]
impl SessionSink for RecordingSessionSink {
    async fn broadcast(&self, message: BridgeMessage) {
        self.messages.lock().unwrap().push(message);
    }
}
