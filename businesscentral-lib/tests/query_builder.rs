//! Query construction through the public API.

mod common;

use businesscentral_lib::api::AggregateOp;
use businesscentral_lib::api::query::Expr;
use businesscentral_lib::api::query::Projection;
use businesscentral_lib::api::query::Query;
use businesscentral_lib::error::QueryError;
use common::*;

#[test]
fn test_compound_filter() {
    let query = Query::<Customer>::new()
        .filter(Customer::BALANCE.gt(0).and(Customer::COUNTRY.eq("US")))
        .unwrap();
    assert_eq!(
        query.option("$filter"),
        Some("((balance gt 0) and (countryRegionCode eq 'US'))")
    );
}

#[test]
fn test_then_by_requires_order_by() {
    let err = Query::<Customer>::new()
        .then_by(Customer::NAME)
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::MissingPrimaryOrder {
            field: "displayName".to_string()
        }
    );
}

#[test]
fn test_select_requires_pick() {
    assert!(matches!(
        Query::<Customer>::new().select(Customer::NAME.member()),
        Err(QueryError::InvalidProjection(_))
    ));
    assert!(matches!(
        Query::<Customer>::new().select(Projection::Single(Expr::literal("x"))),
        Err(QueryError::InvalidProjection(_))
    ));
}

#[test]
fn test_top_then_zero_clears() {
    let query = Query::<Customer>::new().top(5).top(0);
    assert!(!query.to_query_string().contains("$top"));
}

#[test]
fn test_full_query_string() {
    let query = Query::<Customer>::new()
        .select(Projection::pick([Customer::NUMBER, Customer::NAME]))
        .unwrap()
        .filter(Customer::NAME.starts_with("Ad").or(Customer::NUMBER.is_in(["10000", "20000"])))
        .unwrap()
        .order_by_descending(Customer::BALANCE)
        .then_by(Customer::NUMBER)
        .unwrap()
        .top(20)
        .count(true);

    assert_eq!(
        query.to_query_string(),
        "$select=number%2CdisplayName\
         &$filter=%28startswith%28displayName%2C%27Ad%27%29%20or%20number%20in%20%28%2710000%27%2C%2720000%27%29%29\
         &$orderby=balance%20desc%2Cnumber\
         &$top=20\
         &$count=true"
    );
}

#[test]
fn test_apply_grouping() {
    let query = Query::<Customer>::new()
        .apply(|a| {
            a.group_by([Customer::COUNTRY])?
                .aggregate(Customer::BALANCE, AggregateOp::Sum, "totalBalance")?
                .count("customers")
        })
        .unwrap();
    assert_eq!(
        query.option("$apply"),
        Some("groupby((countryRegionCode),aggregate(balance with sum as totalBalance,$count as customers))")
    );
}

#[test]
fn test_predicate_reuse_across_queries() {
    let active = Customer::BALANCE.ge(100).not();
    let first = Query::<Customer>::new().filter(active.clone()).unwrap();
    let second = Query::<Customer>::new().filter(active).unwrap();
    assert_eq!(first.option("$filter"), Some("not ((balance ge 100))"));
    assert_eq!(first.option("$filter"), second.option("$filter"));
}
