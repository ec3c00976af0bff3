//! Fixed demo content for development and test harnesses.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use workit_shared::constants::DEFAULT_CURRENCY;
use workit_shared::types::{ConversationId, MessageId, PaymentMethodId, TransactionId, UserId};
use workit_store::{
    Conversation, Message, PaymentKind, PaymentMethod, Transaction, TransactionStatus,
};

pub(crate) type MessageMap = HashMap<ConversationId, Vec<Message>>;

/// Three client conversations with `user`, each with its latest message cached.
pub(crate) fn conversations(user: &UserId) -> (Vec<Conversation>, MessageMap) {
    let now = Utc::now();
    // (id, client, title, [(message id, sent by user, hours ago, text, read)])
    let threads: [(&str, &str, &str, &[(&str, bool, i64, &str, bool)]); 3] = [
        (
            "conv_1",
            "client_1",
            "Développement Web Fullstack",
            &[
                ("msg_1", false, 24, "Bonjour, j'aimerais discuter du projet de développement web.", true),
                ("msg_2", true, 23, "Bonjour ! Bien sûr, je suis disponible pour en discuter. Quels sont vos besoins ?", true),
                ("msg_3", false, 2, "J'ai besoin d'un site e-commerce avec une intégration de paiement.", false),
            ],
        ),
        (
            "conv_2",
            "client_2",
            "Création de Logo",
            &[
                ("msg_4", false, 48, "Pouvez-vous me créer un logo pour ma nouvelle startup ?", true),
                ("msg_5", true, 47, "Bien sûr ! Pouvez-vous me donner plus de détails sur votre entreprise ?", true),
            ],
        ),
        (
            "conv_3",
            "client_3",
            "Développement d'API",
            &[("msg_6", false, 5, "Bonjour, j'ai besoin d'une API pour mon application mobile.", false)],
        ),
    ];

    let mut list = Vec::with_capacity(threads.len());
    let mut messages = MessageMap::new();

    for (conv_id, client, title, lines) in threads {
        let conv_id = ConversationId::from(conv_id);
        let client = UserId::from(client);

        let thread: Vec<Message> = lines
            .iter()
            .map(|&(id, from_user, hours_ago, content, is_read)| {
                let (sender_id, receiver_id) = if from_user {
                    (user.clone(), client.clone())
                } else {
                    (client.clone(), user.clone())
                };
                Message {
                    id: MessageId::from(id),
                    conversation_id: conv_id.clone(),
                    sender_id,
                    receiver_id,
                    content: content.to_string(),
                    timestamp: now - Duration::hours(hours_ago),
                    is_read,
                }
            })
            .collect();

        list.push(Conversation {
            id: conv_id.clone(),
            participants: [user.clone(), client],
            title: Some(title.to_string()),
            last_message: thread.last().cloned(),
        });
        messages.insert(conv_id, thread);
    }

    (list, messages)
}

/// A default Visa card, a PayPal account and two completed purchases.
pub(crate) fn ledger(user: &UserId) -> (Vec<PaymentMethod>, Vec<Transaction>) {
    let now = Utc::now();

    let methods = vec![
        PaymentMethod {
            id: PaymentMethodId::from("pm_1"),
            kind: PaymentKind::CreditCard,
            last4: Some("4242".into()),
            expiry_date: Some("12/25".into()),
            name: "Visa".into(),
            is_default: true,
        },
        PaymentMethod {
            id: PaymentMethodId::from("pm_2"),
            kind: PaymentKind::Paypal,
            last4: None,
            expiry_date: None,
            name: "My PayPal Account".into(),
            is_default: false,
        },
    ];

    let purchase = |id: &str, service: &str, name: &str, amount: f64, days_ago: i64, order: &str| {
        Transaction {
            id: TransactionId::from(id),
            user_id: user.clone(),
            service_id: service.into(),
            service_name: name.into(),
            amount,
            currency: DEFAULT_CURRENCY.into(),
            status: TransactionStatus::Completed,
            payment_method_id: PaymentMethodId::from("pm_1"),
            timestamp: now - Duration::days(days_ago),
            order_id: order.into(),
        }
    };

    let transactions = vec![
        purchase("tx_1", "svc_1", "Développement Web Fullstack", 150.0, 3, "ORD-001"),
        purchase("tx_2", "svc_2", "Création de Logo", 80.0, 10, "ORD-002"),
    ];

    (methods, transactions)
}
