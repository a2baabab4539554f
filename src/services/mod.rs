/// Sign-in URL, session resolution and sign-out.
pub mod auth_service;
/// Change feed publication for game, profile and message writes.
pub mod change_events;
/// Map view and markers for upcoming games.
pub mod discover_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game listing, creation, edition, cancellation and deletion.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Automatic completion of games whose scheduled date has passed.
pub mod lifecycle;
/// Upcoming/past partition and live listings.
pub mod listing;
/// Game chat.
pub mod message_service;
/// Player profiles.
pub mod profile_service;
/// Capacity-checked registration.
pub mod roster;
/// Server-Sent Events streams.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
