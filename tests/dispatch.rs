use artemis_cr_reducer::{
    cert_manager,
    config_list::{self, FactoryClass},
    crd::{Acceptor, ActiveMQArtemis, Connector},
    error::ReducerError,
    reducer::{
        are_mandatory_values_set, dispatch, new_artemis_cr, v713, Action, BrokerVersion,
        FormState, GlobalAction, IngressDomain, V712Action, V713Action,
    },
};
use k8s_openapi::api::core::v1::EnvVar;

fn run(state: &FormState, actions: Vec<Action>) -> FormState {
    actions.into_iter().fold(state.clone(), |state, action| {
        dispatch(&state, action).unwrap()
    })
}

fn pem_broker() -> FormState {
    run(
        &new_artemis_cr("ns"),
        vec![
            V712Action::SetIngressDomain(IngressDomain::new("apps.example.com", true)).into(),
            V712Action::AddAcceptor.into(),
            V712Action::ActivatePemGenerationForAcceptor {
                acceptor: "acceptors0".into(),
                issuer: "letsencrypt".into(),
            }
            .into(),
        ],
    )
}

fn tls_hosts(cr: &ActiveMQArtemis) -> Vec<String> {
    let rt = &cr.spec.resource_templates.as_ref().unwrap()[0];
    rt.tls().unwrap().hosts.clone().unwrap()
}

#[test]
fn cert_manager_hosts_follow_replicas() {
    let state = pem_broker();
    assert_eq!(
        tls_hosts(&state.cr),
        vec!["ing.acceptors0.ex-aao-0.ns.apps.example.com"]
    );

    let state = run(&state, vec![V712Action::IncrementReplicas.into()]);
    assert_eq!(
        tls_hosts(&state.cr),
        vec![
            "ing.acceptors0.ex-aao-0.ns.apps.example.com",
            "ing.acceptors0.ex-aao-1.ns.apps.example.com",
        ]
    );
}

#[test]
fn broker_rename_relinks_resource_template() {
    let state = run(&pem_broker(), vec![V712Action::SetBrokerName("bro".into()).into()]);

    let rt = &state.cr.spec.resource_templates.as_ref().unwrap()[0];
    assert_eq!(rt.selector_name(), Some("bro-acceptors0-0-svc-ing"));
    assert_eq!(
        tls_hosts(&state.cr),
        vec!["ing.acceptors0.bro-0.ns.apps.example.com"]
    );
    assert_eq!(
        rt.tls().unwrap().secret_name.as_deref(),
        Some("bro-acceptors0-0-svc-ing-ptls")
    );

    let acceptor = config_list::get_acceptor(&state.cr.spec, "acceptors0").unwrap();
    assert_eq!(
        acceptor.ssl_secret.as_deref(),
        Some("bro-acceptors0-0-svc-ing-ptls")
    );
    assert_eq!(
        cert_manager::get_acceptor_from_cert_manager_resource_template(&state.cr, rt)
            .map(|acceptor| acceptor.name.as_str()),
        Some("acceptors0")
    );
    assert_eq!(
        cert_manager::get_issuer_for_acceptor(&state.cr, "acceptors0"),
        Some("letsencrypt")
    );
}

#[test]
fn issuer_can_be_changed_and_preset_removed() {
    let state = run(
        &pem_broker(),
        vec![V712Action::UpdateAnnotationIssuer {
            acceptor_name: "acceptors0".into(),
            new_issuer: "internal-ca".into(),
        }
        .into()],
    );
    assert_eq!(
        cert_manager::get_issuer_for_acceptor(&state.cr, "acceptors0"),
        Some("internal-ca")
    );
    assert_eq!(
        cert_manager::get_issuer_ingress_host_for_acceptor(&state.cr, "acceptors0", 0),
        Some("ing.acceptors0.ex-aao-0.ns.apps.example.com")
    );

    let state = run(
        &state,
        vec![V712Action::DeletePemGenerationForAcceptor("acceptors0".into()).into()],
    );
    assert_eq!(state.cr.spec.resource_templates, None);
    let acceptor = config_list::get_acceptor(&state.cr.spec, "acceptors0").unwrap();
    assert_eq!(acceptor.ssl_secret, None);
    assert_eq!(acceptor.ingress_host, None);
}

#[test]
fn disabling_ssl_drops_pem_preset() {
    let state = run(
        &pem_broker(),
        vec![
            V712Action::SetAcceptorSecret {
                name: "acceptors0".into(),
                secret: Some("client-ca".into()),
                is_ca: true,
            }
            .into(),
            V712Action::SetAcceptorSslEnabled {
                name: "acceptors0".into(),
                ssl_enabled: false,
            }
            .into(),
        ],
    );

    assert_eq!(state.cr.spec.resource_templates, None);
    assert_eq!(cert_manager::get_issuer_for_acceptor(&state.cr, "acceptors0"), None);

    let acceptor = config_list::get_acceptor(&state.cr.spec, "acceptors0").unwrap();
    assert_eq!(acceptor.ssl_enabled, Some(false));
    assert_eq!(acceptor.ssl_secret, None);
    assert_eq!(acceptor.trust_secret, None);
    assert_eq!(acceptor.need_client_auth, None);
    assert_eq!(acceptor.want_client_auth, None);
    assert_eq!(acceptor.ingress_host, None);
}

#[test]
fn rename_collision_keeps_both_names() {
    let state = run(
        &new_artemis_cr("ns"),
        vec![
            V712Action::AddAcceptor.into(),
            V712Action::AddAcceptor.into(),
            V712Action::SetAcceptorName {
                old_name: "acceptors1".into(),
                new_name: "acceptors0".into(),
            }
            .into(),
        ],
    );

    let names = config_list::list_names::<Acceptor>(&state.cr.spec);
    assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["acceptors0", "acceptors1"]);
}

#[test]
fn token_auth_round_trip_restores_defaults() {
    let initial = new_artemis_cr("ns");
    let state = run(
        &initial,
        vec![
            V713Action::IsUsingToken(true).into(),
            V713Action::SetServiceAccount("console-sa".into()).into(),
            V713Action::SetJaasExtraConfig(Some("jaas-config".into())).into(),
        ],
    );
    assert_eq!(state.cr.spec.admin_user, None);
    assert!(are_mandatory_values_set(&state));

    let state = run(&state, vec![V713Action::IsUsingToken(false).into()]);
    assert_eq!(state.cr, initial.cr);
}

#[test]
fn downgrade_tears_down_extended_fields() {
    let state = run(
        &new_artemis_cr("ns"),
        vec![
            V713Action::IsUsingToken(true).into(),
            V713Action::SetServiceAccount("console-sa".into()).into(),
            V713Action::SetJaasExtraConfig(Some("jaas-config".into())).into(),
            V713Action::SetSecurityRoles(v713::init_security_roles(["admins=alice"])).into(),
        ],
    );
    assert_eq!(v713::get_security_roles(&state.cr).len(), 12);

    let state = run(
        &state,
        vec![GlobalAction::SetBrokerVersion(BrokerVersion::V712).into()],
    );
    let spec = &state.cr.spec;
    let plan = spec.deployment_plan.as_ref().unwrap();

    assert_eq!(state.broker_version, BrokerVersion::V712);
    assert_eq!(spec.admin_user.as_deref(), Some("admin"));
    assert_eq!(spec.admin_password.as_deref(), Some("admin"));
    assert_eq!(spec.env, None);
    assert_eq!(plan.extra_mounts, None);
    assert_eq!(plan.pod_security, None);
    assert!(v713::get_security_roles(&state.cr).is_empty());

    let error = dispatch(&state, V713Action::SetServiceAccount("sa".into()).into()).unwrap_err();
    assert_eq!(
        error,
        ReducerError::UnhandledAction {
            action: "setServiceAccount",
            version: BrokerVersion::V712,
        }
    );
}

#[test]
fn downgrade_keeps_unrelated_java_args() {
    let mut state = new_artemis_cr("ns");
    state.cr.spec.env = Some(vec![EnvVar {
        name: v713::JAVA_ARGS_APPEND.into(),
        value: Some("-Xmx1g".into()),
        value_from: None,
    }]);

    let state = run(
        &state,
        vec![GlobalAction::SetBrokerVersion(BrokerVersion::V712).into()],
    );
    assert_eq!(
        state.cr.spec.env,
        Some(vec![EnvVar {
            name: v713::JAVA_ARGS_APPEND.into(),
            value: Some("-Xmx1g".into()),
            value_from: None,
        }])
    );
}

#[test]
fn endpoint_properties_follow_endpoint_edits() {
    let state = run(
        &new_artemis_cr("ns"),
        vec![
            V712Action::AddConnector.into(),
            V712Action::UpdateConnectorFactoryClass {
                name: "connectors0".into(),
                class: FactoryClass::Invm,
            }
            .into(),
            V712Action::SetConnectorOtherParams {
                name: "connectors0".into(),
                other_params: [("batchDelay".to_string(), "10".to_string())].into(),
            }
            .into(),
            V712Action::SetConnectorName {
                old_name: "connectors0".into(),
                new_name: "cluster".into(),
            }
            .into(),
        ],
    );

    let spec = &state.cr.spec;
    assert_eq!(
        config_list::get_config_factory_class::<Connector>(spec, "cluster"),
        FactoryClass::Invm
    );
    assert_eq!(
        spec.broker_properties.clone().unwrap(),
        vec![
            "connectorConfigurations.cluster.factoryClassName=org.apache.activemq.artemis.core.remoting.impl.invm.InVMConnectorFactory",
            "connectorConfigurations.cluster.params.batchDelay=10",
        ]
    );

    let state = run(&state, vec![V712Action::DeleteConnector("cluster".into()).into()]);
    assert_eq!(state.cr.spec.broker_properties, Some(vec![]));
}

#[test]
fn restricted_switch_needs_namespace() {
    let state = dispatch(
        &FormState::default(),
        GlobalAction::SetIsRestricted(true).into(),
    )
    .unwrap();
    assert!(!state.is_restricted());
    assert_eq!(state.cr, FormState::default().cr);
    assert!(state.has_changes);
}

#[test]
fn action_log_replays_from_json() {
    let actions: Vec<Action> = serde_json::from_str(
        r#"[
            {"operation": "addAcceptor"},
            {"operation": "setAcceptorPort", "payload": {"name": "acceptors0", "port": 61616}},
            {"operation": "setAcceptorSSLEnabled", "payload": {"name": "acceptors0", "sslEnabled": true}},
            {"operation": "setReplicasNumber", "payload": 3}
        ]"#,
    )
    .unwrap();

    let state = run(&new_artemis_cr("ns"), actions);
    let acceptor = config_list::get_acceptor(&state.cr.spec, "acceptors0").unwrap();
    assert_eq!(acceptor.port, Some(61616));
    assert_eq!(acceptor.ssl_enabled, Some(true));
    assert_eq!(state.cr.spec.deployment_plan.as_ref().unwrap().size, 3);
}
