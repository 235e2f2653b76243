//! Turn orchestration: phase traces, persistence and failure modes

mod common;

use common::{Harness, ScriptedGenerator};
use contratai_core::{ContratAiError, Orchestrator, Phase, PromptId, Role, SessionStore, ToolRegistry};

fn orchestrator(h: &Harness) -> Orchestrator {
    Orchestrator::new(h.ctx.clone(), ToolRegistry::builtin())
}

#[tokio::test]
async fn test_direct_answer_ends_after_conversational() {
    let h = Harness::new(ScriptedGenerator::new().push(
        PromptId::ChatAgent,
        r#"{"answer": "Olá! Como posso ajudar?", "use_tool": false}"#,
    ));

    let outcome = orchestrator(&h).run_turn("s1", "Oi").await.unwrap();

    assert_eq!(outcome.trace, vec![Phase::Conversational, Phase::Terminal]);
    assert_eq!(outcome.answer, "Olá! Como posso ajudar?");
    assert!(outcome.tool_used.is_none());
    assert!(!outcome.exit_requested);

    let messages = h.db.load_history("s1").unwrap();
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(messages[1].content, "Olá! Como posso ajudar?");
}

#[tokio::test]
async fn test_use_tool_defaults_to_false() {
    let h = Harness::new(ScriptedGenerator::new().push(PromptId::ChatAgent, r#"{"answer": "ok"}"#));
    let outcome = orchestrator(&h).run_turn("s", "Oi").await.unwrap();
    assert_eq!(outcome.trace, vec![Phase::Conversational, Phase::Terminal]);
}

#[tokio::test]
async fn test_tool_path_visits_every_phase_and_persists_one_reply() {
    let h = Harness::new(
        ScriptedGenerator::new()
            .push(
                PromptId::ChatAgent,
                r#"{"answer": "Até mais!", "use_tool": true, "function": "leave_chat", "args": []}"#,
            )
            .push(
                PromptId::ToolAgent,
                r#"{"answer": "Encerrando", "use_tool": true, "function": "leave_chat", "args": []}"#,
            ),
    );

    let outcome = orchestrator(&h).run_turn("s2", "quero sair").await.unwrap();

    assert_eq!(
        outcome.trace,
        vec![
            Phase::Conversational,
            Phase::ToolSelection,
            Phase::ToolExecution,
            Phase::Terminal
        ]
    );
    assert_eq!(outcome.tool_used.as_deref(), Some("leave_chat"));
    assert!(outcome.exit_requested);
    assert_eq!(outcome.answer, "Sessão encerrada. Até logo!");

    let messages = h.db.load_history("s2").unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, outcome.answer);
}

#[tokio::test]
async fn test_tool_selection_sees_conversational_output_in_history() {
    let chat = r#"{"answer": "Vou verificar", "use_tool": true}"#;
    let h = Harness::new(
        ScriptedGenerator::new()
            .push(PromptId::ChatAgent, chat)
            .push(PromptId::ToolAgent, r#"{"function": "leave_chat", "args": []}"#),
    );

    orchestrator(&h).run_turn("s", "tchau").await.unwrap();

    let selection = h.generator.calls_to(PromptId::ToolAgent);
    assert_eq!(selection.len(), 1);
    let history = selection[0].get("history").unwrap();
    assert!(history.contains("User: tchau"));
    assert!(history.ends_with(chat));
    assert!(selection[0].get("tools_list").unwrap().contains("generate_contracts"));
}

#[tokio::test]
async fn test_unknown_tool_fails_without_assistant_message() {
    let h = Harness::new(
        ScriptedGenerator::new()
            .push(PromptId::ChatAgent, r#"{"answer": "...", "use_tool": true}"#)
            .push(
                PromptId::ToolAgent,
                r#"{"use_tool": true, "function": "delete_everything", "args": []}"#,
            ),
    );

    let err = orchestrator(&h).run_turn("s3", "apague tudo").await.unwrap_err();
    assert!(matches!(err, ContratAiError::ToolNotFound(ref name) if name == "delete_everything"));

    let messages = h.db.load_history("s3").unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
}

#[tokio::test]
async fn test_malformed_output_fails_the_turn() {
    let h = Harness::new(ScriptedGenerator::new().push(PromptId::ChatAgent, "Claro! Posso ajudar."));
    let err = orchestrator(&h).run_turn("s4", "Oi").await.unwrap_err();
    assert!(matches!(err, ContratAiError::MalformedGenerationOutput(_)));
    assert_eq!(h.db.load_history("s4").unwrap().len(), 1);
}

#[tokio::test]
async fn test_direct_reply_without_answer_is_malformed() {
    let h = Harness::new(ScriptedGenerator::new().push(PromptId::ChatAgent, r#"{"use_tool": false}"#));
    let err = orchestrator(&h).run_turn("s5", "Oi").await.unwrap_err();
    assert!(matches!(err, ContratAiError::MalformedGenerationOutput(_)));
}

#[tokio::test]
async fn test_selection_without_function_is_malformed() {
    let h = Harness::new(
        ScriptedGenerator::new()
            .push(PromptId::ChatAgent, r#"{"answer": "", "use_tool": true}"#)
            .push(PromptId::ToolAgent, r#"{"answer": "não sei qual"}"#),
    );
    let err = orchestrator(&h).run_turn("s6", "Oi").await.unwrap_err();
    assert!(matches!(err, ContratAiError::MalformedGenerationOutput(_)));
}

#[tokio::test]
async fn test_history_is_clipped_for_generation_only() {
    let h = Harness::with_config(
        ScriptedGenerator::new().always(PromptId::ChatAgent, r#"{"answer": "ok"}"#),
        |config| config.agent.history_max_chars = 50,
    );
    let orchestrator = orchestrator(&h);

    let long_question = "x".repeat(120);
    orchestrator.run_turn("s7", &long_question).await.unwrap();
    orchestrator.run_turn("s7", "segunda pergunta").await.unwrap();

    for vars in h.generator.calls_to(PromptId::ChatAgent) {
        assert!(vars.get("history").unwrap().chars().count() <= 50);
    }

    let stored = h.db.load_history("s7").unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0].content, long_question);
}

#[tokio::test]
async fn test_tool_failure_becomes_error_reply() {
    let h = Harness::new(
        ScriptedGenerator::new()
            .push(PromptId::ChatAgent, r#"{"answer": "Analisando", "use_tool": true}"#)
            .push(
                PromptId::ToolAgent,
                r#"{"function": "analyze_contract", "args": {"file_path": "/nao/existe.txt"}}"#,
            ),
    );

    let outcome = orchestrator(&h).run_turn("s8", "analise meu contrato").await.unwrap();
    assert_eq!(outcome.tool_used.as_deref(), Some("analyze_contract"));
    assert!(outcome.answer.contains("Arquivo não encontrado"));
    assert_eq!(h.db.load_history("s8").unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_required_argument_is_invalid_input() {
    let h = Harness::new(
        ScriptedGenerator::new()
            .push(PromptId::ChatAgent, r#"{"answer": "", "use_tool": true}"#)
            .push(PromptId::ToolAgent, r#"{"function": "analyze_contract", "args": []}"#),
    );
    let err = orchestrator(&h).run_turn("s9", "analise").await.unwrap_err();
    assert!(matches!(err, ContratAiError::InvalidInput(_)));
}
