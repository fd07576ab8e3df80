//! Starter menu served until a real catalog source is wired in.

use domain::{ChoiceGroup, ChoiceOption, Money, Product};
use engine::Catalog;

fn option(id: &str, name: &str, cents: i64) -> ChoiceOption {
    ChoiceOption {
        id: id.to_string(),
        name: name.to_string(),
        price: Money::from_cents(cents),
    }
}

pub fn house_menu() -> Catalog {
    let ponto = ChoiceGroup {
        id: "ponto".to_string(),
        name: "Ponto da carne".to_string(),
        min: 1,
        max: 1,
        options: vec![
            option("mal", "Mal passado", 0),
            option("ao-ponto", "Ao ponto", 0),
            option("bem", "Bem passado", 0),
        ],
    };
    let adicionais = ChoiceGroup {
        id: "adicionais".to_string(),
        name: "Adicionais".to_string(),
        min: 0,
        max: 3,
        options: vec![
            option("bacon", "Bacon", 400),
            option("ovo", "Ovo", 250),
            option("cheddar", "Cheddar", 300),
        ],
    };
    let sabor = ChoiceGroup {
        id: "sabor".to_string(),
        name: "Sabor".to_string(),
        min: 1,
        max: 1,
        options: vec![
            option("laranja", "Laranja", 0),
            option("limao", "Limão", 0),
            option("maracuja", "Maracujá", 100),
        ],
    };

    Catalog::new(vec![
        Product {
            id: "x-burger".to_string(),
            name: "X-Burger".to_string(),
            price: Money::from_cents(2500),
            promotional_price: None,
            choice_groups: vec![ponto.clone(), adicionais.clone()],
        },
        Product {
            id: "x-salada".to_string(),
            name: "X-Salada".to_string(),
            price: Money::from_cents(2800),
            promotional_price: Some(Money::from_cents(2400)),
            choice_groups: vec![ponto, adicionais],
        },
        Product {
            id: "suco".to_string(),
            name: "Suco natural".to_string(),
            price: Money::from_cents(900),
            promotional_price: None,
            choice_groups: vec![sabor],
        },
        Product {
            id: "batata".to_string(),
            name: "Batata frita".to_string(),
            price: Money::from_cents(1500),
            promotional_price: None,
            choice_groups: Vec::new(),
        },
    ])
}
