/**
 * Routes Module
 * API route handlers
 */

pub mod auth;
pub mod contact;
pub mod health;
pub mod listing;
pub mod resources;
pub mod site;
