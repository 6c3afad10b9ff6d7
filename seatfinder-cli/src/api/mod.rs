//! Hosted backend clients

pub mod supabase;

pub use supabase::SupabaseStore;
