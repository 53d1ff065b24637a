//! Pure cart transitions.
//!
//! A transition that changes nothing hands back the same `Arc`, so observers can detect
//! no-ops with `Arc::ptr_eq` instead of comparing contents.

use std::sync::Arc;

use crate::merge;
use crate::models::{CartAction, CartState};

/// Apply `action` to `state`, returning the next state.
pub fn reduce(state: &Arc<CartState>, action: &CartAction) -> Arc<CartState> {
    match action {
        CartAction::AddOne { id } => {
            if state.contains(id) {
                return Arc::clone(state);
            }
            let mut next = CartState::clone(state);
            next.items.push(id.clone());
            Arc::new(next)
        }
        CartAction::AddMany { ids } => {
            let items = merge::union(&state.items, ids);
            if items.len() == state.items.len() {
                return Arc::clone(state);
            }
            with_items(state, items)
        }
        CartAction::RemoveOne { id } => match state.items.iter().position(|item| item == id) {
            Some(doomed) => {
                let mut next = CartState::clone(state);
                next.items.remove(doomed);
                Arc::new(next)
            }
            None => Arc::clone(state),
        },
        CartAction::RemoveMany { ids } => {
            let items = merge::difference(&state.items, ids);
            if items.len() == state.items.len() {
                return Arc::clone(state);
            }
            with_items(state, items)
        }
        CartAction::SetSavedCart { record } => Arc::new(CartState {
            items: state.items.clone(),
            name: state.name.clone(),
            saved_cart: record.clone(),
        }),
        CartAction::Unknown => Arc::clone(state),
    }
}

fn with_items(state: &CartState, items: Vec<String>) -> Arc<CartState> {
    Arc::new(CartState {
        items,
        name: state.name.clone(),
        saved_cart: state.saved_cart.clone(),
    })
}
