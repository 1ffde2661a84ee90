//! Unit tests for identifier resolution
//!
//! Checks the normalized and original naming conventions through the
//! resolver factory used by the mapper.

#[cfg(test)]
mod naming_tests {
    use relgraph::config::NamingConvention;
    use relgraph::graph_catalog::name_resolver::resolver_for;
    use test_case::test_case;

    #[test_case("CUSTOMER_ORDER" ; "caps snake")]
    #[test_case("customer order" ; "spaces")]
    #[test_case("customer-order-line" ; "hyphens")]
    #[test_case("CustomerOrder" ; "already camel")]
    #[test_case("customerOrder" ; "lower camel")]
    #[test_case("X" ; "single letter")]
    #[test_case("_leading" ; "leading separator")]
    fn test_vertex_name_is_idempotent(input: &str) {
        let resolver = resolver_for(NamingConvention::Java);
        let once = resolver.resolve_vertex_name(input);
        assert_eq!(resolver.resolve_vertex_name(&once), once);
        assert!(!once.contains(['_', ' ', '-']));
    }

    #[test_case("CUSTOMER_ID" ; "caps snake")]
    #[test_case("FirstName" ; "upper camel")]
    #[test_case("last name" ; "spaces")]
    fn test_property_name_is_idempotent(input: &str) {
        let resolver = resolver_for(NamingConvention::Java);
        let once = resolver.resolve_vertex_property(input);
        assert_eq!(resolver.resolve_vertex_property(&once), once);
        assert!(once.chars().next().is_some_and(|c| !c.is_uppercase()));
    }

    #[test]
    fn test_all_caps_is_lowered_before_joining() {
        let resolver = resolver_for(NamingConvention::Java);
        assert_eq!(resolver.resolve_vertex_name("ORDER_LINE_ITEM"), "OrderLineItem");
        assert_eq!(resolver.resolve_vertex_property("ORDER_LINE_ITEM"), "orderLineItem");
    }

    #[test]
    fn test_mixed_case_keeps_inner_capitals() {
        let resolver = resolver_for(NamingConvention::Java);
        assert_eq!(resolver.resolve_vertex_name("order_HEADER"), "OrderHEADER");
    }

    #[test]
    fn test_original_convention() {
        let resolver = resolver_for(NamingConvention::Original);
        assert_eq!(resolver.resolve_vertex_name("ORDER LINE"), "ORDER_LINE");
        assert_eq!(resolver.resolve_vertex_name("order_line"), "order_line");
        assert_eq!(resolver.resolve_vertex_property("Unit Price"), "Unit_Price");
    }
}
