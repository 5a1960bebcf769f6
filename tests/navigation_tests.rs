// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the route stack and navigation rules

use qrscan::app::{NavigationController, Route, RouteStack};
use qrscan::errors::ScanError;
use qrscan::DecodedValue;

fn result(value: &str) -> Route {
    Route::Result(DecodedValue::from(value))
}

#[test]
fn test_starts_at_home() {
    let nav = NavigationController::new();
    assert_eq!(nav.current(), &Route::Home);
    assert_eq!(nav.stack().entries(), &[Route::Home]);
}

#[test]
fn test_result_prunes_to_home_regardless_of_depth() {
    let mut nav = NavigationController::new();
    nav.open_scanner(true).unwrap();
    nav.show_result(DecodedValue::from("CODE123")).unwrap();

    // Stack is exactly [Home, Result]
    assert_eq!(nav.stack().len(), 2);
    assert_eq!(nav.stack().entries(), &[Route::Home, result("CODE123")]);
}

#[test]
fn test_back_from_result_never_lands_on_scanner() {
    let mut nav = NavigationController::new();
    nav.open_scanner(true).unwrap();
    nav.show_result(DecodedValue::from("A")).unwrap();

    let mut stack = nav.stack().clone();
    stack.pop();
    assert_eq!(stack.top(), &Route::Home);
}

#[test]
fn test_scan_again_collapses_to_single_home() {
    let mut nav = NavigationController::new();
    for value in ["A", "B", "C"] {
        nav.open_scanner(true).unwrap();
        nav.show_result(DecodedValue::from(value)).unwrap();
        let change = nav.scan_again().unwrap();
        assert_eq!(change.from, result(value));
        assert_eq!(change.to, Route::Home);
        assert_eq!(nav.stack().entries(), &[Route::Home]);
    }
}

#[test]
fn test_dismiss_scanner_pops_back_home() {
    let mut nav = NavigationController::new();
    nav.open_scanner(true).unwrap();
    let change = nav.dismiss_scanner().unwrap();
    assert_eq!(change.from, Route::Scanner);
    assert_eq!(nav.stack().entries(), &[Route::Home]);
}

#[test]
fn test_permission_denied_leaves_stack_untouched() {
    let mut nav = NavigationController::new();
    assert_eq!(nav.open_scanner(false), Err(ScanError::PermissionDenied));
    assert_eq!(nav.stack().entries(), &[Route::Home]);
}

#[test]
fn test_actions_rejected_on_wrong_screen() {
    let mut nav = NavigationController::new();
    assert!(matches!(
        nav.dismiss_scanner(),
        Err(ScanError::InvalidTransition { from: "home", .. })
    ));
    assert!(matches!(
        nav.scan_again(),
        Err(ScanError::InvalidTransition { from: "home", .. })
    ));

    nav.open_scanner(true).unwrap();
    assert!(matches!(
        nav.open_scanner(true),
        Err(ScanError::InvalidTransition { from: "scanner", .. })
    ));

    nav.show_result(DecodedValue::from("A")).unwrap();
    assert!(matches!(
        nav.show_result(DecodedValue::from("B")),
        Err(ScanError::InvalidTransition { from: "result", .. })
    ));
    assert_eq!(nav.stack().entries(), &[Route::Home, result("A")]);
}

#[test]
fn test_stack_never_holds_two_results() {
    let mut stack = RouteStack::new();
    stack.push(result("A"));
    stack.push(result("B"));
    stack.push(result("C"));

    let results = stack.entries().iter().filter(|r| r.is_result()).count();
    assert_eq!(results, 1);
    assert_eq!(stack.top(), &result("C"));
}

#[test]
fn test_replace_all_and_pop_up_to() {
    let mut stack = RouteStack::new();
    stack.push(Route::Scanner);
    stack.push(result("A"));

    stack.pop_up_to(&Route::Scanner, false);
    assert_eq!(stack.entries(), &[Route::Home, Route::Scanner]);

    stack.replace_all(Route::Home);
    assert_eq!(stack.entries(), &[Route::Home]);
}

#[test]
fn test_route_serializes_with_value() {
    let json = serde_json::to_string(&result("CODE123")).unwrap();
    assert_eq!(json, r#"{"route":"result","value":"CODE123"}"#);
    let json = serde_json::to_string(&Route::Home).unwrap();
    assert_eq!(json, r#"{"route":"home"}"#);
}
