// Chunk a statute the way the law index does, without any model service

use contratai_core::config::ChunkingConfig;
use contratai_core::{normalize_law_text, RecursiveChunker};

const SAMPLE: &str = "LEI Nº 8.078, DE 11 DE SETEMBRO DE 1990.

Dispõe sobre a proteção do consumidor e dá outras providências. Art. 1° O presente código estabelece normas de proteção e defesa do consumidor, de ordem pública e interesse social.
Art. 2° Consumidor é toda pessoa física ou jurídica que adquire ou utiliza produto ou serviço como destinatário final.
Parágrafo único. Equipara-se a consumidor a coletividade de pessoas, ainda que indetermináveis, que haja intervindo nas relações de consumo.
Art. 49. O consumidor pode desistir do contrato, no prazo de 7 dias a contar de sua assinatura ou do ato de recebimento do produto ou serviço.";

fn main() -> contratai_core::Result<()> {
    let (source, text) = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            (path, text)
        }
        None => ("cdc_excerpt.txt".to_string(), SAMPLE.to_string()),
    };

    let config = ChunkingConfig {
        chunk_size: 300,
        chunk_overlap: 60,
        ..ChunkingConfig::default()
    };
    let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap, config.separators);

    let normalized = normalize_law_text(&text);
    let chunks = chunker.chunk(&source, &normalized);

    println!("{}: {} chunks\n", source, chunks.len());
    for chunk in &chunks {
        println!(
            "--- #{} [{}..{}] {} chars",
            chunk.index,
            chunk.start,
            chunk.end,
            chunk.text.chars().count()
        );
        println!("{}\n", chunk.text.trim());
    }

    Ok(())
}
