//! Property-based checks for target ARN composition

use proptest::prelude::*;
use std::sync::Arc;

use stepf_deploy::deploy::{
    state_machine_arn, DeploySettings, DeploymentOrchestrator, InvocationContext, DEFAULT_REGION,
};
use stepf_deploy::external::RecordingAwsOperations;

fn region_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z]{2}-[a-z]{4,9}-[1-3]")
}

proptest! {
    #[test]
    fn prop_arn_has_fixed_shape(
        name in "[A-Za-z0-9_-]{1,80}",
        account in "[0-9]{12}",
        region in region_strategy(),
    ) {
        let ctx = InvocationContext::new(name.clone()).with_region(region.clone());
        let arn = state_machine_arn(ctx.region_or(DEFAULT_REGION), &account, &ctx.statemachine);

        let expected_region = region.unwrap_or_else(|| "us-east-1".to_string());
        prop_assert_eq!(
            arn,
            format!("arn:aws:states:{expected_region}:{account}:stateMachine:{name}")
        );
    }

    #[test]
    fn prop_resolved_arn_ends_with_name_verbatim(name in "\\PC{1,40}") {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let fake = Arc::new(RecordingAwsOperations::new().with_account("1234"));
        let orchestrator = DeploymentOrchestrator::new(fake, DeploySettings::default());

        let arn = runtime
            .block_on(orchestrator.resolve_target_arn(&InvocationContext::new(name.clone())))
            .unwrap();

        prop_assert!(arn.starts_with("arn:aws:states:us-east-1:1234:stateMachine:"));
        prop_assert!(arn.ends_with(&name));
    }
}

#[test]
fn test_order_flow_scenario() {
    assert_eq!(
        state_machine_arn(DEFAULT_REGION, "1234", "OrderFlow"),
        "arn:aws:states:us-east-1:1234:stateMachine:OrderFlow"
    );
}
