//! Prompt templates
//!
//! Every generation step is addressed by a [`PromptId`]. Built-in templates
//! can be overridden per id by dropping `<id>.txt` into the configured
//! prompts directory. Placeholders are `{name}`; `{{` and `}}` produce
//! literal braces.

use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

/// Identifier of a prompt template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PromptId {
    ChatAgent,
    ToolAgent,
    LawFilter,
    ExpandQuery,
    RetrieveLaw,
    AnalyzeContract,
    RefactorContract,
    ContractFilter,
    ContractValidate,
    FillContract,
}

impl PromptId {
    pub const ALL: [PromptId; 10] = [
        PromptId::ChatAgent,
        PromptId::ToolAgent,
        PromptId::LawFilter,
        PromptId::ExpandQuery,
        PromptId::RetrieveLaw,
        PromptId::AnalyzeContract,
        PromptId::RefactorContract,
        PromptId::ContractFilter,
        PromptId::ContractValidate,
        PromptId::FillContract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptId::ChatAgent => "chat_agent",
            PromptId::ToolAgent => "tool_agent",
            PromptId::LawFilter => "law_filter",
            PromptId::ExpandQuery => "expand_query",
            PromptId::RetrieveLaw => "retrieve_law",
            PromptId::AnalyzeContract => "analyze_contract",
            PromptId::RefactorContract => "refactor_contract",
            PromptId::ContractFilter => "contract_filter",
            PromptId::ContractValidate => "contract_validate",
            PromptId::FillContract => "fill_contract",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            PromptId::ChatAgent => CHAT_AGENT,
            PromptId::ToolAgent => TOOL_AGENT,
            PromptId::LawFilter => LAW_FILTER,
            PromptId::ExpandQuery => EXPAND_QUERY,
            PromptId::RetrieveLaw => RETRIEVE_LAW,
            PromptId::AnalyzeContract => ANALYZE_CONTRACT,
            PromptId::RefactorContract => REFACTOR_CONTRACT,
            PromptId::ContractFilter => CONTRACT_FILTER,
            PromptId::ContractValidate => CONTRACT_VALIDATE,
            PromptId::FillContract => FILL_CONTRACT,
        }
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named values substituted into a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptVars(BTreeMap<String, String>);

impl PromptVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Resolved set of templates
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    overrides: HashMap<PromptId, String>,
}

impl PromptLibrary {
    /// Built-in templates only
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Built-ins plus any `<id>.txt` found in `dir`
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut overrides = HashMap::new();
        for id in PromptId::ALL {
            let path = dir.join(format!("{}.txt", id.as_str()));
            if path.is_file() {
                tracing::debug!("Loading prompt override {}", path.display());
                overrides.insert(id, std::fs::read_to_string(&path)?);
            }
        }
        Ok(Self { overrides })
    }

    pub fn template(&self, id: PromptId) -> &str {
        self.overrides
            .get(&id)
            .map(String::as_str)
            .unwrap_or_else(|| id.builtin())
    }

    pub fn render(&self, id: PromptId, vars: &PromptVars) -> String {
        render_template(self.template(id), vars)
    }
}

/// Substitute `{name}` placeholders. Unknown placeholders are left as-is.
pub fn render_template(template: &str, vars: &PromptVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('{') {
            match tail[1..].find('}') {
                Some(close) => {
                    let name = &tail[1..=close];
                    let is_ident = !name.is_empty()
                        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                    match vars.get(name) {
                        Some(value) if is_ident => out.push_str(value),
                        _ => out.push_str(&tail[..close + 2]),
                    }
                    rest = &tail[close + 2..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push('}');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

const CHAT_AGENT: &str = r#"Você é o ContratAI, assistente jurídico especializado em direito brasileiro e contratos.
Converse com o usuário de forma clara e objetiva. Se a solicitação exigir consulta à legislação,
análise, reformulação ou geração de contratos, ou se o usuário quiser encerrar a conversa,
indique que uma ferramenta deve ser usada.

Ferramentas disponíveis:
{tools_list}

Histórico da conversa:
{history}

Pergunta do usuário: {question}

Responda SOMENTE com JSON no formato:
{{"answer": "sua resposta ao usuário", "use_tool": false}}
ou, quando uma ferramenta for necessária:
{{"answer": "breve aviso ao usuário", "use_tool": true, "function": "nome_da_ferramenta", "args": ["arg1", "arg2"]}}"#;

const TOOL_AGENT: &str = r#"Você é o seletor de ferramentas do ContratAI. Escolha exatamente UMA ferramenta da lista
e monte seus argumentos na ordem declarada dos parâmetros (ou como objeto nomeado).

Ferramentas disponíveis:
{tools_list}

Histórico da conversa:
{history}

Pergunta do usuário: {question}

Responda SOMENTE com JSON no formato:
{{"answer": "o que será feito", "use_tool": true, "function": "nome_da_ferramenta", "args": ["arg1", "arg2"]}}"#;

const LAW_FILTER: &str = r#"Dada a pergunta jurídica e o histórico, indique quais arquivos de legislação brasileira
devem ser consultados. Se não tiver certeza, devolva uma lista vazia.

Arquivos disponíveis:
{sources}

Histórico: {history}
Pergunta: {question}

Responda SOMENTE com JSON: {{"sources": ["arquivo1.txt", "arquivo2.txt"]}}"#;

const EXPAND_QUERY: &str = r#"Gere {count} variantes da seguinte pergunta para melhorar a recuperação de informações.
O output deve ser JSON com o campo "variations" contendo a lista das perguntas geradas:
{{"variations": ["variação 1", "variação 2"]}}

Pergunta: {question}"#;

const RETRIEVE_LAW: &str = r#"Você é o ContratAI, assistente jurídico. Responda à pergunta usando apenas o contexto
da legislação brasileira abaixo, citando artigos quando possível. Se o contexto não for
suficiente, diga isso claramente.

Contexto:
{context}

Histórico: {history}
Pergunta: {question}

Responda SOMENTE com JSON: {{"answer": "resposta fundamentada", "sources": ["artigos citados"]}}"#;

const ANALYZE_CONTRACT: &str = r#"Você é um advogado especialista em contratos. Analise o documento abaixo.

Documento:
{document}

Histórico: {history}
Solicitação: {question}

Responda SOMENTE com JSON contendo:
{{"metadata": {{"parties": [], "object": "", "term": ""}},
 "risk_analysis": {{"overall_risk": "baixo|médio|alto", "risks": []}},
 "missing_clauses": [],
 "obligations": [],
 "executive_summary": {{"summary": "", "recommendation": ""}}}}"#;

const REFACTOR_CONTRACT: &str = r#"Você é um advogado especialista em redação contratual. Reformule o contrato abaixo
conforme a solicitação, mantendo conformidade com a legislação brasileira.

Contrato original:
{document}

Histórico: {history}
Solicitação: {question}

Responda SOMENTE com JSON:
{{"refactored_contract": {{"full_text": "texto integral reformulado", "summary": "principais alterações"}}}}"#;

const CONTRACT_FILTER: &str = r#"Identifique qual tipo de contrato o usuário deseja gerar, escolhendo APENAS entre os tipos abaixo.
Se nenhum corresponder, responda com "match": false.

Tipos disponíveis:
{contracts}

Histórico: {history}
Solicitação: {question}

Responda SOMENTE com JSON:
{{"match": true, "contract_type": "nome_exato_do_tipo", "confidence": "high|medium|low", "reason": "justificativa"}}"#;

const CONTRACT_VALIDATE: &str = r#"O modelo de contrato mais próximo da solicitação do usuário é "{candidate}": {description}

Trecho do modelo:
{template}

Histórico: {history}
Solicitação: {question}

Esse modelo atende à solicitação? Responda SOMENTE com JSON:
{{"match": true, "confidence": "high|medium|low", "reason": "justificativa"}}"#;

const FILL_CONTRACT: &str = r#"Preencha o modelo de contrato com os dados fornecidos pelo usuário.

Modelo:
{template}

Campos obrigatórios:
{required_fields}

Dados do usuário: {user_data}
Histórico recente: {history}

Se TODOS os campos obrigatórios estiverem presentes, responda:
{{"status": "completed", "filled_contract": "contrato preenchido", "answer": "mensagem ao usuário"}}
Caso contrário, responda:
{{"status": "missing_info", "missing_fields": ["campo1", "campo2"], "answer": "pergunta ao usuário pelos dados faltantes"}}"#;
