/// Router Module Index
///
/// Splits the service into the two halves the gate treats differently.

/// Service endpoints under `/api`. Listed in the gate's bypass prefixes,
/// so they are reachable without a locale or a session.
pub mod service;

/// Storefront pages. Everything here runs behind the locale & auth gate.
pub mod storefront;
