//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes the schema.

diesel::table! {
    /// Registered accounts, admins and users alike.
    users (id) {
        id -> Uuid,
        #[max_length = 100]
        full_name -> Varchar,
        /// Lower-cased; unique.
        #[max_length = 255]
        email -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        #[max_length = 255]
        address -> Varchar,
        #[max_length = 10]
        pincode -> Varchar,
        /// `admin` or `user`.
        #[max_length = 16]
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Parking lots, each owned by the admin who created it.
    parking_lots (id) {
        id -> Uuid,
        owner_id -> Uuid,
        #[max_length = 100]
        name -> Varchar,
        #[max_length = 255]
        address -> Varchar,
        #[max_length = 10]
        pincode -> Varchar,
        price_per_hour_cents -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Spots within a lot; `(lot_id, number)` is unique.
    parking_spots (id) {
        id -> Uuid,
        lot_id -> Uuid,
        number -> Int4,
        occupied -> Bool,
    }
}

diesel::table! {
    /// Reservation history with snapshots of lot and spot details.
    ///
    /// `lot_id` and `spot_id` are set to NULL when the lot or spot is deleted.
    reservations (id) {
        id -> Uuid,
        user_id -> Uuid,
        lot_id -> Nullable<Uuid>,
        spot_id -> Nullable<Uuid>,
        #[max_length = 100]
        lot_name -> Varchar,
        #[max_length = 255]
        lot_address -> Varchar,
        spot_number -> Int4,
        #[max_length = 16]
        vehicle_number -> Nullable<Varchar>,
        held_at -> Timestamptz,
        start_time -> Nullable<Timestamptz>,
        end_time -> Nullable<Timestamptz>,
        cost_cents -> Nullable<Int8>,
        billed_rate_cents -> Nullable<Int8>,
    }
}

diesel::joinable!(parking_lots -> users (owner_id));
diesel::joinable!(parking_spots -> parking_lots (lot_id));
diesel::joinable!(reservations -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(parking_lots, parking_spots, reservations, users);
