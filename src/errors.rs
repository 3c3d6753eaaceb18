// Copyright 2025 Cowboy AI, LLC.

//! Error types for registry command flows
//!
//! Every rejection a flow can produce is one variant of [`FlowError`]. Variants carry the
//! context the protocol layer needs to render an error response (offending names, expected
//! amounts). Nothing here is retried by the flow except [`FlowError::TransactionConflict`],
//! which only surfaces once the retry budget is spent.

use crate::domain::value_objects::Money;
use crate::fees::FeeCategory;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse grouping of flow errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Malformed command or name
    Syntax,
    /// TLD policy rejected the command
    Policy,
    /// Linked or target resources are in the wrong state
    Resource,
    /// Signed mark or claims notice problems
    Trademark,
    /// Fee extension problems
    Fee,
    /// Allocation token problems
    AllocationToken,
    /// Caller is not allowed to do this
    Authorization,
    /// Contention in the persistence layer
    Transient,
    /// Broken internal invariant
    Internal,
}

/// Errors that can occur while processing a registry command
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    // --- syntax ---
    /// Extension used without being declared at login
    #[error("Service extension(s) must be declared at login: {uri}")]
    UndeclaredServiceExtension {
        /// URI of the undeclared extension
        uri: String,
    },

    /// Extension not implemented by this command
    #[error("Specified extension is not implemented: {uri}")]
    UnimplementedExtension {
        /// URI of the unknown extension
        uri: String,
    },

    /// Characters outside `a-z 0-9 - .`
    #[error("Domain name contains invalid characters: {name}")]
    BadDomainNameCharacter {
        /// The name as submitted
        name: String,
    },

    /// A dot-separated part is empty
    #[error("No part of a domain name can be empty")]
    EmptyDomainNamePart,

    /// Name is not exactly one label under a TLD
    #[error("Domain name must have exactly one part above the TLD: {name}")]
    BadDomainNamePartsCount {
        /// The name as submitted
        name: String,
    },

    /// The requested name is itself a TLD
    #[error("Domain name must not equal an existing multi-part TLD: {name}")]
    DomainNameExistsAsTld {
        /// The name as submitted
        name: String,
    },

    /// Label longer than 63 characters
    #[error("Domain labels cannot be longer than 63 characters")]
    DomainLabelTooLong,

    /// Label starts with a dash
    #[error("Domain name starts with a dash")]
    LeadingDash,

    /// Label ends with a dash
    #[error("Domain name ends with a dash")]
    TrailingDash,

    /// `--` in positions 3 and 4 of a non-ACE label
    #[error("Non-IDN domain names cannot contain hyphens in the third or fourth position")]
    DashesInThirdAndFourth,

    /// ACE label does not decode to valid punycode
    #[error("Domain name starts with xn-- but is not a valid IDN")]
    InvalidPunycode,

    /// Decoded label uses code points outside every IDN table of the TLD
    #[error("Domain label is not allowed by IDN table")]
    InvalidIdnDomainLabel,

    /// Period given in something other than years
    #[error("Periods for domain registrations must be specified in years")]
    BadPeriodUnit,

    /// Zero-length period
    #[error("Registration period must be at least one year")]
    InvalidPeriodValue,

    // --- policy ---
    /// No configured TLD matches the name
    #[error("Domain name is under tld {tld} which doesn't exist")]
    TldDoesNotExist {
        /// Parent part of the submitted name
        tld: String,
    },

    /// Name is on a reserved list and no override applies
    #[error("{name} is a reserved domain")]
    DomainReserved {
        /// Fully qualified name
        name: String,
    },

    /// Plain create outside general availability
    #[error("The current registry phase does not allow for general registrations")]
    NoGeneralRegistrationsInCurrentPhase,

    /// Start-date sunrise create without a signed mark
    #[error("Declared launch extension phase does not allow creates without signed marks")]
    MustHaveSignedMarksInCurrentPhase,

    /// Create-restricted TLD and the name is not nameserver-restricted
    #[error("Domain {name} is not allowed to be created on a TLD with domain create restrictions")]
    DomainNotAllowedForTldWithCreateRestriction {
        /// Fully qualified name
        name: String,
    },

    /// Registrant outside the TLD allow-list
    #[error("Registrant with id {contact} is not whitelisted for this TLD")]
    RegistrantNotAllowed {
        /// Contact id of the registrant
        contact: String,
    },

    /// Nameservers outside the TLD allow-list
    #[error("Nameservers '{}' are not whitelisted for this TLD", .hosts.join(","))]
    NameserversNotAllowedForTld {
        /// Offending host names
        hosts: Vec<String>,
    },

    /// Nameservers outside the name-specific allow-list
    #[error("Nameservers '{}' are not whitelisted for this domain", .hosts.join(","))]
    NameserversNotAllowedForDomain {
        /// Offending host names
        hosts: Vec<String>,
    },

    /// TLD has a nameserver allow-list but none were given
    #[error("At least one nameserver must be specified for domain {name} on a TLD with a nameserver whitelist")]
    NameserversNotSpecifiedForTldWithNameserverWhitelist {
        /// Fully qualified name
        name: String,
    },

    /// Name is nameserver-restricted but none were given
    #[error("At least one nameserver must be specified for nameserver-restricted domain {name}")]
    NameserversNotSpecifiedForNameserverRestrictedDomain {
        /// Fully qualified name
        name: String,
    },

    /// A pending application exists for the name
    #[error("There is an open application for this domain")]
    DomainHasOpenApplications,

    /// More nameservers than allowed
    #[error("Only {max} nameservers are allowed per domain, got {count}")]
    TooManyNameservers {
        /// Submitted count
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// More DS records than allowed
    #[error("At most {max} DS records are allowed, got {count}")]
    TooManyDsRecords {
        /// Submitted count
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// secDNS maxSigLife present
    #[error("The maxSigLife setting is not supported")]
    MaxSigLifeNotSupported,

    /// Period above the registration-year cap
    #[error("Registration period exceeds the maximum of {max} years")]
    ExceedsMaxRegistrationYears {
        /// Configured cap
        max: u32,
    },

    // --- resource ---
    /// Target name already exists
    #[error("Object with given ID ({id}) already exists")]
    ResourceAlreadyExists {
        /// Fully qualified name
        id: String,
    },

    /// Referenced contacts or hosts are missing
    #[error("The {kind} with given IDs ({}) doesn't exist", .ids.join(","))]
    LinkedResourcesDoNotExist {
        /// "contact" or "host"
        kind: &'static str,
        /// Missing identifiers
        ids: Vec<String>,
    },

    /// Referenced contacts or hosts are pending delete
    #[error("Linked resource in pending delete prohibits operation: {}", .ids.join(","))]
    LinkedResourceInPendingDeleteProhibitsOperation {
        /// Offending identifiers
        ids: Vec<String>,
    },

    /// A role was given more than once
    #[error("More than one contact for a given role is not allowed")]
    DuplicateContactForRole,

    /// A contact reference without a role
    #[error("Contact type must be specified")]
    MissingContactType,

    /// No registrant
    #[error("Registrant must be specified")]
    MissingRegistrant,

    /// No admin contact
    #[error("Admin contact must be specified")]
    MissingAdminContact,

    /// No technical contact
    #[error("Technical contact must be specified")]
    MissingTechnicalContact,

    // --- trademark / claims ---
    /// Signed mark outside sunrise
    #[error("Signed marks are only allowed during sunrise")]
    SignedMarksOnlyDuringSunrise,

    /// More than one signed mark
    #[error("Only one signed mark is allowed per application")]
    TooManySignedMarks,

    /// Code marks are not supported
    #[error("A mark was supplied that is not supported")]
    UnsupportedMarkType,

    /// Signed mark could not be decoded or its signature did not verify
    #[error("Signed mark data is invalid")]
    SignedMarkInvalid,

    /// No mark matches the requested label
    #[error("The provided mark does not match the desired domain label")]
    NoMarksFoundMatchingDomain,

    /// Mark validity starts in the future
    #[error("The provided mark is not yet valid")]
    FoundMarkNotYetValid,

    /// Mark validity ended
    #[error("The provided mark has expired")]
    FoundMarkExpired,

    /// Claims notice validator is not the configured one
    #[error("The only supported validationID is '{expected}'")]
    InvalidTrademarkValidator {
        /// The accepted validator id
        expected: String,
    },

    /// Claims notice has expired
    #[error("The claims notice has expired")]
    ExpiredClaim,

    /// Claims notice accepted outside the acceptance window
    #[error("The acceptance time of the claims notice is too long ago")]
    AcceptedTooLongAgo,

    /// TCN id is not 8 hex digits followed by 19 decimal digits
    #[error("The TCNID is malformed")]
    MalformedTcnId,

    /// TCN id checksum does not match
    #[error("The checksum in the specified TCNID does not validate")]
    InvalidTcnIdChecksum,

    /// Claims notice sent after the claims period
    #[error("The claims period for this TLD has ended")]
    ClaimsPeriodEnded,

    /// Claims notice for a label not on the claims list
    #[error("Specified claims notice is not needed for {name}")]
    UnexpectedClaimsNotice {
        /// Fully qualified name
        name: String,
    },

    /// Label on the claims list but no notice supplied
    #[error("The claims notice is required for {name}")]
    MissingClaimsNotice {
        /// Fully qualified name
        name: String,
    },

    // --- fee ---
    /// Declared fee description matches no category
    #[error("No fee description matches: {description}")]
    FeeDescriptionParse {
        /// The description as declared
        description: String,
    },

    /// Declared fee description matches several categories
    #[error("The fee description \"{description}\" matches multiple fee types: {}", describe_categories(.categories))]
    FeeDescriptionMultipleMatches {
        /// The description as declared
        description: String,
        /// Every matching category
        categories: Vec<FeeCategory>,
    },

    /// Declared fees do not equal the computed fees
    #[error("The fees passed in the transform command do not match the {}", describe_mismatch(.expected, .category))]
    FeesMismatch {
        /// Amount that was expected
        expected: Money,
        /// Category when a per-category sum failed, `None` for the total
        category: Option<FeeCategory>,
    },

    /// Declared currency differs from the TLD currency
    #[error("The currency passed in the transform command ({actual}) does not match the currency on the server ({expected})")]
    CurrencyUnitMismatch {
        /// TLD currency
        expected: String,
        /// Declared currency
        actual: String,
    },

    /// Declared amount has more fraction digits than the currency allows
    #[error("Currency value scale {scale} is too precise for {currency}")]
    CurrencyValueScale {
        /// Declared currency
        currency: String,
        /// Scale after normalisation
        scale: u32,
    },

    /// Refundable / grace-period / applied with a non-default value
    #[error("Fee attribute {attribute} is not supported")]
    UnsupportedFeeAttribute {
        /// Attribute name
        attribute: &'static str,
    },

    /// EAP active and no fee extension
    #[error("Fees must be explicitly acknowledged when creating domains during the Early Access Program. The EAP fee is: {eap_fee}")]
    FeesRequiredDuringEarlyAccessProgram {
        /// EAP fee in effect
        eap_fee: Money,
    },

    // --- allocation token ---
    /// Token does not exist
    #[error("The allocation token is invalid")]
    InvalidAllocationToken {
        /// Token string as submitted
        token: String,
    },

    /// Token was already redeemed
    #[error("Alloc token was already redeemed")]
    AlreadyRedeemedAllocationToken {
        /// Token string as submitted
        token: String,
    },

    /// Token is bound to a different name
    #[error("The allocation token is not valid for this domain")]
    AllocationTokenNotValidForDomain {
        /// Token string as submitted
        token: String,
    },

    // --- authorization ---
    /// Registrar unknown to the directory
    #[error("Registrar {registrar} does not exist")]
    RegistrarNotFound {
        /// Registrar client id
        registrar: String,
    },

    /// Registrar is not active
    #[error("Registrar must be active in order to create domains")]
    RegistrarMustBeActiveToCreateDomains,

    /// Registrar not allowed on the TLD
    #[error("Registrar is not authorized to access the TLD {tld}")]
    NotAuthorizedForTld {
        /// TLD name
        tld: String,
    },

    /// Premium name without fee acknowledgement
    #[error("Fee must be specified for premium domain names")]
    FeesRequiredForPremiumName,

    /// Registrar blocks premium names
    #[error("Premium names are blocked for this registrar")]
    PremiumNameBlocked,

    /// Metadata extension from a non-tool request
    #[error("Metadata extensions can only be passed by tools")]
    OnlyToolCanPassMetadata,

    /// Anchor tenant create with the wrong period
    #[error("Anchor tenant domain create is for the wrong number of years (must be {years})")]
    AnchorTenantCreatePeriod {
        /// Required anchor-tenant period
        years: u32,
    },

    // --- transient / internal ---
    /// Transaction conflicted on every attempt
    #[error("Transaction conflicted after {attempts} attempts")]
    TransactionConflict {
        /// Number of attempts made
        attempts: u32,
    },

    /// Store failed for a reason other than contention
    #[error("Store error: {0}")]
    Store(String),

    /// Flow state machine was driven along an illegal edge
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },
}

fn describe_categories(categories: &[FeeCategory]) -> String {
    categories
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_mismatch(expected: &Money, category: &Option<FeeCategory>) -> String {
    match category {
        Some(category) => format!("expected fee of {expected} for {}", category.name()),
        None => format!("expected total of {expected}"),
    }
}

/// Result type for flow operations
pub type FlowResult<T> = Result<T, FlowError>;

impl FlowError {
    /// The taxonomy group this error belongs to
    pub fn category(&self) -> ErrorCategory {
        use FlowError::*;
        match self {
            UndeclaredServiceExtension { .. }
            | UnimplementedExtension { .. }
            | BadDomainNameCharacter { .. }
            | EmptyDomainNamePart
            | BadDomainNamePartsCount { .. }
            | DomainNameExistsAsTld { .. }
            | DomainLabelTooLong
            | LeadingDash
            | TrailingDash
            | DashesInThirdAndFourth
            | InvalidPunycode
            | InvalidIdnDomainLabel
            | BadPeriodUnit
            | InvalidPeriodValue => ErrorCategory::Syntax,

            TldDoesNotExist { .. }
            | DomainReserved { .. }
            | NoGeneralRegistrationsInCurrentPhase
            | MustHaveSignedMarksInCurrentPhase
            | DomainNotAllowedForTldWithCreateRestriction { .. }
            | RegistrantNotAllowed { .. }
            | NameserversNotAllowedForTld { .. }
            | NameserversNotAllowedForDomain { .. }
            | NameserversNotSpecifiedForTldWithNameserverWhitelist { .. }
            | NameserversNotSpecifiedForNameserverRestrictedDomain { .. }
            | DomainHasOpenApplications
            | TooManyNameservers { .. }
            | TooManyDsRecords { .. }
            | MaxSigLifeNotSupported
            | ExceedsMaxRegistrationYears { .. } => ErrorCategory::Policy,

            ResourceAlreadyExists { .. }
            | LinkedResourcesDoNotExist { .. }
            | LinkedResourceInPendingDeleteProhibitsOperation { .. }
            | DuplicateContactForRole
            | MissingContactType
            | MissingRegistrant
            | MissingAdminContact
            | MissingTechnicalContact => ErrorCategory::Resource,

            SignedMarksOnlyDuringSunrise
            | TooManySignedMarks
            | UnsupportedMarkType
            | SignedMarkInvalid
            | NoMarksFoundMatchingDomain
            | FoundMarkNotYetValid
            | FoundMarkExpired
            | InvalidTrademarkValidator { .. }
            | ExpiredClaim
            | AcceptedTooLongAgo
            | MalformedTcnId
            | InvalidTcnIdChecksum
            | ClaimsPeriodEnded
            | UnexpectedClaimsNotice { .. }
            | MissingClaimsNotice { .. } => ErrorCategory::Trademark,

            FeeDescriptionParse { .. }
            | FeeDescriptionMultipleMatches { .. }
            | FeesMismatch { .. }
            | CurrencyUnitMismatch { .. }
            | CurrencyValueScale { .. }
            | UnsupportedFeeAttribute { .. }
            | FeesRequiredDuringEarlyAccessProgram { .. } => ErrorCategory::Fee,

            InvalidAllocationToken { .. }
            | AlreadyRedeemedAllocationToken { .. }
            | AllocationTokenNotValidForDomain { .. } => ErrorCategory::AllocationToken,

            RegistrarNotFound { .. }
            | RegistrarMustBeActiveToCreateDomains
            | NotAuthorizedForTld { .. }
            | FeesRequiredForPremiumName
            | PremiumNameBlocked
            | OnlyToolCanPassMetadata
            | AnchorTenantCreatePeriod { .. } => ErrorCategory::Authorization,

            TransactionConflict { .. } | Store(_) => ErrorCategory::Transient,

            InvalidStateTransition { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this is a name or command syntax error
    pub fn is_syntax_error(&self) -> bool {
        self.category() == ErrorCategory::Syntax
    }

    /// Check if this is a fee error
    pub fn is_fee_error(&self) -> bool {
        self.category() == ErrorCategory::Fee
    }

    /// Check if this is a trademark or claims error
    pub fn is_trademark_error(&self) -> bool {
        self.category() == ErrorCategory::Trademark
    }

    /// Check if the collaborator may retry the command as-is
    pub fn is_transient(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }
}
