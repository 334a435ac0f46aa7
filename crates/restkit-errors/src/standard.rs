//! Built-in exception taxonomy.
//!
//! # Design
//! - Framework kinds hang directly off the root and share its code; the tree
//!   renderer reports them as ambiguous, which is expected.
//! - Business and system families each own a code namespace that their
//!   members override individually.

use crate::kind::{Category, KindSpec};
use crate::registry::{ExceptionRegistry, RegistryResult};

/// Names of the built-in kinds.
pub mod kinds {
    /// Taxonomy root.
    pub const API_EXCEPTION: &str = "api_exception";
    /// Malformed request payload.
    pub const PARSE_ERROR: &str = "parse_error";
    /// Missing credentials.
    pub const NOT_AUTHENTICATED: &str = "not_authenticated";
    /// Unknown route.
    pub const NOT_FOUND: &str = "not_found";
    /// Known route, unsupported method.
    pub const METHOD_NOT_ALLOWED: &str = "method_not_allowed";
    /// Request body over the configured limit.
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    /// Base of the system family.
    pub const SYSTEM_ERROR: &str = "system_error";
    /// Internal framework fault.
    pub const FRAMEWORK_EXCEPTION: &str = "framework_exception";
    /// Optimistic concurrency control failure.
    pub const OPTIMISTIC_CONCURRENCY_CONTROL_FAILED: &str = "optimistic_concurrency_control_failed";
    /// Upstream HTTP failure.
    pub const STUB_HTTP_ERROR: &str = "stub_http_error";
    /// Base of the business family.
    pub const BUSINESS_ERROR: &str = "business_error";
    /// Rejected credentials.
    pub const LOGIN_FAILED: &str = "login_failed";
    /// Input validation failure.
    pub const INVALID_PARAMETERS: &str = "invalid_parameters";
    /// Missing object.
    pub const OBJECT_NOT_FOUND: &str = "object_not_found";
}

/// Code shared by the root and every kind that does not override it.
pub const ROOT_CODE: i64 = 2_000_000_000;

impl ExceptionRegistry {
    /// Registry holding the built-in taxonomy, with `system_error` as fallback.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in declarations are inconsistent.
    pub fn standard() -> RegistryResult<Self> {
        let mut registry = Self::new(
            KindSpec::new(kinds::API_EXCEPTION)
                .code(ROOT_CODE)
                .status(500)
                .message("A server error occurred.")
                .category(Category::Root),
        )?;

        let framework = |name: &'static str, status: u16, message: &'static str| {
            KindSpec::new(name)
                .status(status)
                .message(message)
                .category(Category::Framework)
        };
        registry.register(
            framework(kinds::PARSE_ERROR, 400, "Malformed request."),
            kinds::API_EXCEPTION,
        )?;
        registry.register(
            framework(
                kinds::NOT_AUTHENTICATED,
                401,
                "Authentication credentials were not provided.",
            ),
            kinds::API_EXCEPTION,
        )?;
        registry.register(
            framework(kinds::NOT_FOUND, 404, "Not found."),
            kinds::API_EXCEPTION,
        )?;
        registry.register(
            framework(kinds::METHOD_NOT_ALLOWED, 405, "Method not allowed."),
            kinds::API_EXCEPTION,
        )?;
        registry.register(
            framework(kinds::PAYLOAD_TOO_LARGE, 413, "Request payload too large."),
            kinds::API_EXCEPTION,
        )?;

        registry.register(
            KindSpec::new(kinds::SYSTEM_ERROR)
                .code(9999)
                .message("Internal system error. Please try again later.")
                .category(Category::System),
            kinds::API_EXCEPTION,
        )?;
        registry.register(
            KindSpec::new(kinds::FRAMEWORK_EXCEPTION)
                .code(1)
                .message("Framework exception."),
            kinds::SYSTEM_ERROR,
        )?;
        registry.register(
            KindSpec::new(kinds::OPTIMISTIC_CONCURRENCY_CONTROL_FAILED)
                .code(10)
                .message("Optimistic Concurrency Control failed."),
            kinds::SYSTEM_ERROR,
        )?;
        registry.register(
            KindSpec::new(kinds::STUB_HTTP_ERROR)
                .code(20)
                .message("HTTP error."),
            kinds::SYSTEM_ERROR,
        )?;

        registry.register(
            KindSpec::new(kinds::BUSINESS_ERROR)
                .code(19999)
                .status(400)
                .category(Category::Business),
            kinds::API_EXCEPTION,
        )?;
        registry.register(
            KindSpec::new(kinds::LOGIN_FAILED)
                .code(30)
                .status(401)
                .message("Login failed."),
            kinds::BUSINESS_ERROR,
        )?;
        registry.register(
            KindSpec::new(kinds::INVALID_PARAMETERS)
                .code(10000)
                .status(400)
                .message("Invalid parameters."),
            kinds::BUSINESS_ERROR,
        )?;
        registry.register(
            KindSpec::new(kinds::OBJECT_NOT_FOUND)
                .code(10001)
                .message("Object not found."),
            kinds::BUSINESS_ERROR,
        )?;

        registry.set_fallback(kinds::SYSTEM_ERROR)?;
        Ok(registry)
    }
}
