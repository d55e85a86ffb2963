//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly; Diesel uses
//! them for compile-time query validation and type-safe SQL generation.

diesel::table! {
    /// Marketplace users.
    ///
    /// The `id` column carries the identity provider's stable id, so a login
    /// from a fresh device finds the same record.
    users (id) {
        id -> Text,
        name -> Text,
        /// Current session CSRF token.
        token -> Text,
        avatar -> Text,
        contact -> Text,
        /// Connected payment-gateway account, once onboarding completes.
        wallet_id -> Nullable<Text>,
        /// Lifetime host earnings in the smallest currency unit.
        income -> Int8,
        /// Booking ids where this user is the tenant, oldest first.
        bookings -> Array<Text>,
        /// Listing ids where this user is the host, oldest first.
        listings -> Array<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Bookable properties.
    listings (id) {
        id -> Text,
        title -> Text,
        description -> Text,
        image -> Text,
        host -> Text,
        listing_type -> Text,
        address -> Text,
        country -> Text,
        admin -> Text,
        city -> Text,
        /// Nightly price in the smallest currency unit.
        price -> Int8,
        num_of_guests -> Int4,
        /// Booking ids against this listing, oldest first.
        bookings -> Array<Text>,
        /// Denormalised year → month → day booked-day index.
        bookings_index -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Confirmed stays.
    bookings (id) {
        id -> Text,
        listing -> Text,
        tenant -> Text,
        check_in -> Date,
        check_out -> Date,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, listings, bookings);
